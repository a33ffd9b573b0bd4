//! Runtime timer characterization.
//!
//! The timer's tick and the workload's duration differ from machine to
//! machine, so both are measured here instead of being baked in. A useful
//! workload spans several ticks; 200–800 ns is the recommended window.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::config::PhitConfig;
use crate::timer::TimerSource;
use crate::workload::{Sink, harvest_workload};

/// Recommended wall-clock duration of one calibrated workload, in ns.
pub const RECOMMENDED_WORKLOAD_NS: RangeInclusive<u64> = 200..=800;

/// Smallest non-zero delta between consecutive timer reads over `probes`
/// read pairs. `None` if the timer never advanced.
pub fn measure_timer_tick<T: TimerSource + ?Sized>(timer: &T, probes: usize) -> Option<u64> {
    let mut prev = timer.now_ns();
    let mut tick: Option<u64> = None;
    for _ in 0..probes {
        let now = timer.now_ns();
        let delta = now.saturating_sub(prev);
        if delta > 0 {
            tick = Some(tick.map_or(delta, |t| t.min(delta)));
        }
        prev = now;
    }
    tick
}

/// Round `delta_ns` to the nearest whole number of ticks.
///
/// `None` when `tick_ns` is zero.
pub fn quantize(delta_ns: u64, tick_ns: u64) -> Option<u64> {
    if tick_ns == 0 {
        return None;
    }
    Some(delta_ns.saturating_add(tick_ns / 2) / tick_ns)
}

/// Machine information recorded alongside a calibration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInfo {
    pub os: String,
    pub arch: String,
    pub cores: usize,
}

/// Detect machine information (best-effort).
pub fn detect_machine_info() -> MachineInfo {
    MachineInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cores: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    }
}

/// Measured timer and workload characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerProfile {
    /// Minimum observed non-zero timer delta.
    pub tick_ns: Option<u64>,
    /// Number of workload executions timed.
    pub probes: usize,
    /// Harvest workload iterations used.
    pub harvest_iterations: u32,
    pub workload_min_ns: u64,
    pub workload_median_ns: u64,
    pub workload_max_ns: u64,
    /// Median workload duration in ticks.
    pub ticks_per_workload: Option<f64>,
    /// Whether the median workload spans more than one tick.
    pub spans_multiple_ticks: bool,
    /// Whether the median lies in [`RECOMMENDED_WORKLOAD_NS`].
    pub within_recommended: bool,
    pub machine: MachineInfo,
}

/// Time `probes` harvest workloads against `timer` and measure its tick.
pub fn calibrate<T: TimerSource + ?Sized>(
    timer: &T,
    config: &PhitConfig,
    probes: usize,
) -> TimerProfile {
    let probes = probes.max(1);
    let tick_ns = measure_timer_tick(timer, probes);

    let mut sink = Sink::new();
    let mut durations: Vec<u64> = (0..probes)
        .map(|_| {
            let t0 = timer.now_ns();
            harvest_workload(config.harvest_iterations, &mut sink);
            timer.now_ns().saturating_sub(t0)
        })
        .collect();
    durations.sort_unstable();

    let workload_min_ns = durations[0];
    let workload_max_ns = durations[durations.len() - 1];
    let workload_median_ns = durations[durations.len() / 2];

    let ticks_per_workload = tick_ns.map(|t| workload_median_ns as f64 / t as f64);
    let spans_multiple_ticks = ticks_per_workload.is_some_and(|n| n > 1.0);
    let within_recommended = RECOMMENDED_WORKLOAD_NS.contains(&workload_median_ns);

    match tick_ns {
        None => log::warn!("timer did not advance across {probes} probes"),
        Some(tick) => log::debug!(
            "timer tick {tick} ns, workload median {workload_median_ns} ns over {probes} probes"
        ),
    }
    if !within_recommended {
        log::warn!(
            "harvest workload median {workload_median_ns} ns is outside the recommended {}-{} ns window",
            RECOMMENDED_WORKLOAD_NS.start(),
            RECOMMENDED_WORKLOAD_NS.end()
        );
    }

    TimerProfile {
        tick_ns,
        probes,
        harvest_iterations: config.harvest_iterations,
        workload_min_ns,
        workload_median_ns,
        workload_max_ns,
        ticks_per_workload,
        spans_multiple_ticks,
        within_recommended,
        machine: detect_machine_info(),
    }
}
