use std::hint::black_box;
use std::time::Instant;

use phit_core::{DEFAULT_LANES, EntropyPool, PhitConfig, PhitRng, compound_sample, route, sample};

/// One benchmark row.
struct BenchRow {
    name: &'static str,
    ops: usize,
    secs: f64,
}

impl BenchRow {
    fn ns_per_op(&self) -> f64 {
        if self.ops == 0 {
            return 0.0;
        }
        self.secs * 1e9 / self.ops as f64
    }

    fn ops_per_sec(&self) -> f64 {
        if self.secs <= 0.0 {
            return 0.0;
        }
        self.ops as f64 / self.secs
    }
}

fn time<F: FnMut()>(name: &'static str, ops: usize, mut f: F) -> BenchRow {
    let t0 = Instant::now();
    for _ in 0..ops {
        f();
    }
    BenchRow {
        name,
        ops,
        secs: t0.elapsed().as_secs_f64(),
    }
}

pub fn run(config: &PhitConfig, iterations: usize) {
    let (mut rng, mut pool) = match (
        PhitRng::with_config(config),
        EntropyPool::<DEFAULT_LANES>::with_config(config),
    ) {
        (Ok(rng), Ok(pool)) => (rng, pool),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Cannot benchmark: {e}");
            std::process::exit(1);
        }
    };

    println!("Benchmarking {iterations} operations each...\n");

    let rows = [
        time("sample", iterations, || {
            black_box(sample());
        }),
        time("compound_sample(2)", iterations, || {
            black_box(compound_sample(2).ok());
        }),
        time("compound_sample(8)", iterations, || {
            black_box(compound_sample(8).ok());
        }),
        time("route(8)", iterations, || {
            black_box(route(8).ok());
        }),
        time("pool.harvest", iterations, || pool.harvest()),
        time("prng.next_u64", iterations, || {
            black_box(rng.next_u64());
        }),
    ];

    println!("{}", "=".repeat(56));
    println!("{:<22} {:>14} {:>16}", "Operation", "ns/op", "ops/sec");
    println!("{}", "-".repeat(56));
    for row in &rows {
        println!(
            "{:<22} {:>14.1} {:>16.0}",
            row.name,
            row.ns_per_op(),
            row.ops_per_sec()
        );
    }
    println!(
        "\nPRNG cost is {} harvests per value plus extraction.",
        pool.lane_count()
    );
}
