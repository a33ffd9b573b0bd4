//! Quick power-on self test.
//!
//! Loose sanity bounds only; the statistical battery in `phit-tests` is the
//! place for real characterization.

use serde::Serialize;

use crate::hash::avalanche32;
use crate::prng::PhitRng;
use crate::router::route;
use crate::timer::{MonotonicClock, TimerSource};
use crate::workload::{DEFAULT_HARVEST_ITERATIONS, Sink, harvest_workload};

const MONOBIT_VALUES: usize = 1000;
const MONOBIT_BOUNDS: (f64, f64) = (0.45, 0.55);
const ROUTE_BUCKETS: usize = 8;
const ROUTE_CALLS: usize = 10_000;
/// Generous ceiling; the 7-df critical value at p = 0.001 is 24.3.
const ROUTE_CHI2_LIMIT: f64 = 30.0;

/// Outcome of one self-test check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfTestCheck {
    pub name: &'static str,
    pub passed: bool,
    pub details: String,
}

/// All self-test outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfTestReport {
    pub checks: Vec<SelfTestCheck>,
}

impl SelfTestReport {
    /// True when every check passed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Run every check against the platform clock.
pub fn self_test() -> SelfTestReport {
    let mut rng = PhitRng::new();
    let checks = vec![
        check_hash(),
        check_prng_distinct(&mut rng),
        check_monobit(&mut rng),
        check_routing(),
        check_timer(&MonotonicClock),
    ];
    let report = SelfTestReport { checks };
    if !report.passed() {
        for c in report.checks.iter().filter(|c| !c.passed) {
            log::warn!("self test '{}' failed: {}", c.name, c.details);
        }
    }
    report
}

fn check_hash() -> SelfTestCheck {
    let stable = avalanche32(42) == avalanche32(42);
    let distinct = avalanche32(42) != avalanche32(43);
    SelfTestCheck {
        name: "hash_determinism",
        passed: stable && distinct,
        details: format!("stable={stable}, distinct={distinct}"),
    }
}

fn check_prng_distinct(rng: &mut PhitRng) -> SelfTestCheck {
    let a = rng.next_u64();
    let b = rng.next_u64();
    SelfTestCheck {
        name: "prng_distinct",
        passed: a != b,
        details: format!("{a:#018x} vs {b:#018x}"),
    }
}

fn check_monobit(rng: &mut PhitRng) -> SelfTestCheck {
    let ones: u64 = (0..MONOBIT_VALUES)
        .map(|_| u64::from(rng.next_u64().count_ones()))
        .sum();
    let ratio = ones as f64 / (MONOBIT_VALUES * 64) as f64;
    SelfTestCheck {
        name: "prng_monobit",
        passed: (MONOBIT_BOUNDS.0..=MONOBIT_BOUNDS.1).contains(&ratio),
        details: format!("ones ratio {ratio:.4}"),
    }
}

fn check_routing() -> SelfTestCheck {
    let mut buckets = [0u64; ROUTE_BUCKETS];
    for _ in 0..ROUTE_CALLS {
        match route(ROUTE_BUCKETS) {
            Ok(dest) => buckets[dest] += 1,
            Err(e) => {
                return SelfTestCheck {
                    name: "route_uniformity",
                    passed: false,
                    details: e.to_string(),
                };
            }
        }
    }
    let expected = ROUTE_CALLS as f64 / ROUTE_BUCKETS as f64;
    let chi2: f64 = buckets
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum();
    SelfTestCheck {
        name: "route_uniformity",
        passed: chi2 <= ROUTE_CHI2_LIMIT,
        details: format!("chi2={chi2:.2} over {ROUTE_BUCKETS} buckets"),
    }
}

fn check_timer<T: TimerSource + ?Sized>(timer: &T) -> SelfTestCheck {
    let mut sink = Sink::new();
    let t1 = timer.now_ns();
    // A single workload can finish inside one tick on coarse clocks; allow a few.
    let mut t2 = t1;
    for _ in 0..1000 {
        harvest_workload(DEFAULT_HARVEST_ITERATIONS, &mut sink);
        t2 = timer.now_ns();
        if t2 > t1 {
            break;
        }
    }
    SelfTestCheck {
        name: "timer_advancing",
        passed: t2 > t1,
        details: format!("delta={} ns", t2.saturating_sub(t1)),
    }
}
