//! Basic phit usage.
//!
//! Draws raw samples, PRNG output and a handful of routing decisions from
//! the platform clock and prints them.
//!
//! Run: `cargo run --example basic`

use phit_core::{PhitRng, compound_sample, route, sample};

fn main() {
    println!("Basic sample:    {:#010x}", sample());
    match compound_sample(4) {
        Ok(s) => println!("Compound (4):    {s:#010x}"),
        Err(e) => eprintln!("compound sample failed: {e}"),
    }

    let mut rng = PhitRng::new();
    println!("PRNG u64:        {:#018x}", rng.next_u64());
    println!("PRNG f64:        {:.6}", rng.next_f64());

    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    print!("PRNG bytes (hex): ");
    for b in &bytes {
        print!("{b:02x}");
    }
    println!();

    // Route 16 requests across 4 backends
    let mut counts = [0usize; 4];
    for _ in 0..16 {
        if let Ok(dest) = route(counts.len()) {
            counts[dest] += 1;
        }
    }
    println!("\nRouted 16 requests: {counts:?}");
    println!("Pool state: {:?}", rng.pool().stats());
}
