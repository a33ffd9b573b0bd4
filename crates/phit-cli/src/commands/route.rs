use std::time::Instant;

use phit_core::route;
use phit_tests::bucket_uniformity;

pub fn run(destinations: usize, tasks: usize, threads: usize) {
    if destinations == 0 {
        eprintln!("Cannot route: --destinations must be at least 1");
        std::process::exit(1);
    }

    distribution(destinations, tasks);
    variable_cost(destinations, tasks);
    if threads > 0 {
        concurrent_dispatch(destinations, tasks, threads);
    }
}

fn route_or_exit(destinations: usize) -> usize {
    match route(destinations) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Routing failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Phit routing next to round-robin on the same task count.
fn distribution(destinations: usize, tasks: usize) {
    println!("Routing {tasks} tasks to {destinations} destinations\n");

    let mut phit = vec![0u64; destinations];
    let mut round_robin = vec![0u64; destinations];
    let t0 = Instant::now();
    for i in 0..tasks {
        phit[route_or_exit(destinations)] += 1;
        round_robin[i % destinations] += 1;
    }
    let elapsed = t0.elapsed().as_secs_f64();

    let expected = tasks as f64 / destinations as f64;
    println!(
        "  {:>6} | {:>10} | {:>10} | Phit deviation",
        "Dest", "Phit", "RoundRobin"
    );
    println!("  {}", "-".repeat(52));
    for (d, (&p, &r)) in phit.iter().zip(&round_robin).enumerate() {
        let dev = if expected > 0.0 {
            (p as f64 - expected) / expected * 100.0
        } else {
            0.0
        };
        println!("  {d:>6} | {p:>10} | {r:>10} | {dev:+.2}%");
    }

    let result = bucket_uniformity(&phit);
    let p = result
        .p_value
        .map_or_else(|| "n/a".to_string(), |p| format!("{p:.4}"));
    println!(
        "\n  Chi² = {:.2} (df={}), p = {p}, grade {}",
        result.statistic,
        destinations.saturating_sub(1),
        result.grade
    );
    if tasks > 0 {
        println!(
            "  {:.0} routes/sec, {:.0} ns/route",
            tasks as f64 / elapsed,
            elapsed * 1e9 / tasks as f64
        );
    }
    println!("  Round-robin needs a shared counter; phit routing shares nothing.");
}

/// Task cost for the variable-cost run: 1..=10 units, cycling.
fn task_cost(i: usize) -> u64 {
    (i % 10) as u64 + 1
}

/// Largest relative deviation of any load from the mean.
fn max_imbalance(loads: &[u64]) -> f64 {
    if loads.is_empty() {
        return 0.0;
    }
    let mean = loads.iter().sum::<u64>() as f64 / loads.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    loads
        .iter()
        .map(|&l| (l as f64 - mean).abs() / mean)
        .fold(0.0, f64::max)
}

fn variable_cost(destinations: usize, tasks: usize) {
    println!("\nVariable-cost tasks (cost 1-10 units)\n");
    let mut load = vec![0u64; destinations];
    let mut count = vec![0u64; destinations];
    for i in 0..tasks {
        let d = route_or_exit(destinations);
        load[d] += task_cost(i);
        count[d] += 1;
    }
    println!("  {:>6} | {:>8} | {:>10}", "Dest", "Tasks", "Load");
    println!("  {}", "-".repeat(30));
    for (d, (&c, &l)) in count.iter().zip(&load).enumerate() {
        println!("  {d:>6} | {c:>8} | {l:>10}");
    }
    println!("\n  Max load imbalance: {:.2}%", max_imbalance(&load) * 100.0);
}

/// Split `tasks` across `threads` workers; the last worker takes the remainder.
fn thread_shares(tasks: usize, threads: usize) -> Vec<usize> {
    if threads == 0 {
        return Vec::new();
    }
    let base = tasks / threads;
    let mut shares = vec![base; threads];
    if let Some(last) = shares.last_mut() {
        *last += tasks % threads;
    }
    shares
}

/// Route each share on its own scoped thread. `None` marks a worker that
/// panicked before returning its counts.
fn dispatch(destinations: usize, shares: &[usize]) -> Vec<Option<Vec<u64>>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = shares
            .iter()
            .map(|&share| {
                scope.spawn(move || {
                    let mut counts = vec![0u64; destinations];
                    for _ in 0..share {
                        match route(destinations) {
                            Ok(d) => counts[d] += 1,
                            Err(_) => break,
                        }
                    }
                    counts
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().ok()).collect()
    })
}

/// Every thread routes its share with only local state; counts are merged
/// after join.
fn concurrent_dispatch(destinations: usize, tasks: usize, threads: usize) {
    println!("\nConcurrent dispatch: {threads} threads, no shared routing state\n");
    let shares = thread_shares(tasks, threads);

    let t0 = Instant::now();
    let per_worker = dispatch(destinations, &shares);
    let elapsed = t0.elapsed().as_secs_f64();

    let mut merged = vec![0u64; destinations];
    for counts in per_worker.iter().flatten() {
        for (m, c) in merged.iter_mut().zip(counts) {
            *m += c;
        }
    }
    let total: u64 = merged.iter().sum();

    println!("  {:>6} | {:>10} | {:>10}", "Worker", "Assigned", "Routed");
    println!("  {}", "-".repeat(33));
    for (w, (share, counts)) in shares.iter().zip(&per_worker).enumerate() {
        match counts {
            Some(counts) => {
                let routed: u64 = counts.iter().sum();
                println!("  {w:>6} | {share:>10} | {routed:>10}");
            }
            None => println!("  {w:>6} | {share:>10} | {:>10}", "panicked"),
        }
    }
    let failed = per_worker.iter().filter(|c| c.is_none()).count();
    if failed > 0 {
        eprintln!("{failed} worker(s) panicked; their tasks are missing from the totals");
    }
    if total != tasks as u64 {
        eprintln!("Routed {total} of {tasks} tasks");
    }

    let result = bucket_uniformity(&merged);
    println!(
        "\n  {total} routes in {:.1} ms ({:.0}/sec), merged chi² = {:.2}, grade {}",
        elapsed * 1000.0,
        total as f64 / elapsed.max(1e-9),
        result.statistic,
        result.grade
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_cost_cycles() {
        assert_eq!(task_cost(0), 1);
        assert_eq!(task_cost(9), 10);
        assert_eq!(task_cost(10), 1);
    }

    #[test]
    fn test_max_imbalance_even() {
        assert_eq!(max_imbalance(&[10, 10, 10, 10]), 0.0);
    }

    #[test]
    fn test_max_imbalance_skewed() {
        // mean 10, worst deviation 5
        let imbalance = max_imbalance(&[15, 5, 10, 10]);
        assert!((imbalance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_max_imbalance_degenerate() {
        assert_eq!(max_imbalance(&[]), 0.0);
        assert_eq!(max_imbalance(&[0, 0]), 0.0);
    }

    // -----------------------------------------------------------------------
    // Concurrent dispatch tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_thread_shares_last_takes_remainder() {
        assert_eq!(thread_shares(10, 4), vec![2, 2, 2, 4]);
        assert_eq!(thread_shares(12, 4), vec![3, 3, 3, 3]);
    }

    #[test]
    fn test_thread_shares_sum_to_tasks() {
        for (tasks, threads) in [(100_000, 3), (7, 7), (1, 1), (999, 16)] {
            let shares = thread_shares(tasks, threads);
            assert_eq!(shares.len(), threads);
            assert_eq!(shares.iter().sum::<usize>(), tasks);
        }
    }

    #[test]
    fn test_thread_shares_more_threads_than_tasks() {
        assert_eq!(thread_shares(3, 5), vec![0, 0, 0, 0, 3]);
        assert!(thread_shares(10, 0).is_empty());
    }

    #[test]
    fn test_dispatch_routes_every_task() {
        let shares = thread_shares(1001, 4);
        let per_worker = dispatch(8, &shares);
        assert_eq!(per_worker.len(), 4);
        for (share, counts) in shares.iter().zip(&per_worker) {
            let counts = counts.as_ref().expect("worker joined");
            assert_eq!(counts.len(), 8);
            assert_eq!(counts.iter().sum::<u64>(), *share as u64);
        }
    }
}
