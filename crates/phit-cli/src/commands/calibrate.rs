use std::path::Path;

use phit_core::{MonotonicClock, PhitConfig, RECOMMENDED_WORKLOAD_NS, calibrate};

pub fn run(config: &PhitConfig, probes: usize, output_path: Option<&str>) {
    println!(
        "Calibrating: {probes} probes, harvest workload of {} iterations\n",
        config.harvest_iterations
    );
    let profile = calibrate(&MonotonicClock, config, probes);

    let tick = profile
        .tick_ns
        .map_or_else(|| "did not advance".to_string(), |t| format!("{t} ns"));
    println!(
        "  Machine:          {}/{} ({} cores)",
        profile.machine.os, profile.machine.arch, profile.machine.cores
    );
    println!("  Timer tick:       {tick}");
    println!(
        "  Workload:         min {} / median {} / max {} ns",
        profile.workload_min_ns, profile.workload_median_ns, profile.workload_max_ns
    );
    if let Some(ticks) = profile.ticks_per_workload {
        println!("  Ticks/workload:   {ticks:.2}");
    }
    println!(
        "  Spans >1 tick:    {}",
        if profile.spans_multiple_ticks { "yes" } else { "no" }
    );
    println!(
        "  In {}-{} ns:     {}",
        RECOMMENDED_WORKLOAD_NS.start(),
        RECOMMENDED_WORKLOAD_NS.end(),
        if profile.within_recommended { "yes" } else { "no" }
    );
    if !profile.within_recommended {
        println!(
            "\n  Adjust --harvest-iterations so the median lands in the recommended window."
        );
    }

    if let Some(path) = output_path {
        if let Err(e) = super::write_json(Path::new(path), &profile) {
            eprintln!("Failed to write profile to {path}: {e}");
            std::process::exit(1);
        }
        println!("\n📄 Profile saved to: {path}");
    }
}
