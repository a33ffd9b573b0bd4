//! Calibrated fixed-cost workloads.
//!
//! The value a workload computes is deterministic; what matters is how long
//! it takes, because the timer read that follows lands at a point in the
//! CPU/timer phase relationship that the workload's duration shifts. The
//! optimizer must therefore never fold or drop the loop. Every iteration is
//! routed through [`std::hint::black_box`] and the final value is written to
//! a caller-owned [`Sink`], so there is no process-wide scratch variable.

use std::hint::black_box;

/// LCG multiplier (Knuth MMIX).
pub const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
/// LCG increment (Knuth MMIX).
pub const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// Seed of the sample extractor's workload.
pub const SAMPLE_SEED: u64 = 0xDEAD_BEEF;
/// Iterations of the sample extractor's workload.
pub const SAMPLE_ITERATIONS: u32 = 10;

/// Seed of the pool harvest workload.
pub const HARVEST_SEED: u64 = 0xCAFE_BABE;
/// Default iterations of the pool harvest workload.
pub const DEFAULT_HARVEST_ITERATIONS: u32 = 20;

/// Opaque write target for workload results.
///
/// Each pool, PRNG or call site owns its own sink; writes go through
/// `black_box` so the compiler has to assume somebody reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sink(u64);

impl Sink {
    /// Create an empty sink.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Publish a value the optimizer cannot prove unobserved.
    #[inline]
    pub fn write(&mut self, value: u64) {
        self.0 = black_box(value);
    }

    /// Last value written.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Multiply-add loop used before every sample read.
///
/// Runs [`SAMPLE_ITERATIONS`] LCG steps from `seed`, stores the result in
/// `sink` and returns it.
#[inline(never)]
pub fn sample_workload(seed: u64, sink: &mut Sink) -> u64 {
    let mut x = black_box(seed);
    for _ in 0..SAMPLE_ITERATIONS {
        x = black_box(x.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT));
    }
    sink.write(x);
    x
}

/// Multiply-xor loop used by pool harvests.
///
/// Each of the `iterations` steps is an LCG update followed by `x ^= x >> 17`,
/// starting from [`HARVEST_SEED`].
#[inline(never)]
pub fn harvest_workload(iterations: u32, sink: &mut Sink) -> u64 {
    let mut x = black_box(HARVEST_SEED);
    for _ in 0..iterations {
        x = x.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT);
        x = black_box(x ^ (x >> 17));
    }
    sink.write(x);
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_workload_value() {
        let mut sink = Sink::new();
        let x = sample_workload(SAMPLE_SEED, &mut sink);
        assert_eq!(x, 0x9C1A_DDA6_F563_2A81);
        assert_eq!(sink.get(), x);
    }

    #[test]
    fn test_harvest_workload_value() {
        let mut sink = Sink::new();
        let x = harvest_workload(DEFAULT_HARVEST_ITERATIONS, &mut sink);
        assert_eq!(x, 0x4132_D878_A28B_266E);
        assert_eq!(sink.get(), x);
    }

    #[test]
    fn test_harvest_workload_zero_iterations_returns_seed() {
        let mut sink = Sink::new();
        assert_eq!(harvest_workload(0, &mut sink), HARVEST_SEED);
    }

    #[test]
    fn test_seed_changes_result() {
        let mut sink = Sink::new();
        let a = sample_workload(SAMPLE_SEED, &mut sink);
        let b = sample_workload(SAMPLE_SEED ^ 1, &mut sink);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sinks_are_independent() {
        let mut a = Sink::new();
        let mut b = Sink::new();
        sample_workload(1, &mut a);
        assert_ne!(a.get(), 0);
        assert_eq!(b.get(), 0);
        harvest_workload(3, &mut b);
        assert_ne!(a.get(), b.get());
    }
}
