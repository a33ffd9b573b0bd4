//! Multi-lane entropy pool with forward-secure extraction.
//!
//! Architecture:
//! 1. `feed`: SplitMix-style whitening of each input against a monotonic
//!    counter, xor into one lane, cross-mix into the next lane
//! 2. `harvest`: run the calibrated workload, read the timer, feed twice
//! 3. `extract`: harvest once per lane, combine all lanes through distinct
//!    rotations, then fold the output back into lanes 0 and 1
//!
//! Lanes are only ever combined through xor and rotation. The pool is owned
//! by one caller at a time; it is `Send` but takes `&mut self` everywhere, so
//! sharing it across threads requires the caller's own lock.

use serde::Serialize;

use crate::config::PhitConfig;
use crate::error::PhitError;
use crate::hash::{GOLDEN_GAMMA, mix64};
use crate::timer::{MonotonicClock, TimerSource};
use crate::workload::{Sink, harvest_workload};

/// Lane count of the reference sizing (256 bits of state).
pub const DEFAULT_LANES: usize = 4;

/// Approximate bits credited per feed. Diagnostic only, not a security bound.
pub const FEED_CREDIT_BITS: u64 = 2;

/// Rotation applied when cross-mixing a lane into its neighbour.
const CROSS_MIX_ROTATION: u32 = 17;

/// Output rotation for each lane. Pairwise distinct so aligned lanes cannot
/// cancel; the first four are the reference amounts.
const OUTPUT_ROTATIONS: [u32; 8] = [0, 13, 29, 43, 51, 5, 37, 59];

/// Rotations of the output folded back into lanes 0 and 1 after extraction.
const RESEED_ROTATIONS: [u32; 2] = [7, 23];

/// Fixed-size accumulator of timing samples.
#[derive(Debug, Clone)]
pub struct EntropyPool<const L: usize = DEFAULT_LANES> {
    lanes: [u64; L],
    mix_counter: u64,
    bits_collected: u64,
    harvest_iterations: u32,
    sink: Sink,
}

impl EntropyPool {
    /// Create a zeroed four-lane pool with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<const L: usize> Default for EntropyPool<L> {
    fn default() -> Self {
        let () = Self::LANES_SUPPORTED;
        Self::zeroed(PhitConfig::default().harvest_iterations)
    }
}

impl<const L: usize> EntropyPool<L> {
    const LANES_SUPPORTED: () = assert!(
        L >= 2 && L <= OUTPUT_ROTATIONS.len(),
        "EntropyPool supports 2 to 8 lanes"
    );

    /// Create a zeroed pool using `config`'s harvest workload size.
    pub fn with_config(config: &PhitConfig) -> Result<Self, PhitError> {
        let () = Self::LANES_SUPPORTED;
        config.validate()?;
        Ok(Self::zeroed(config.harvest_iterations))
    }

    fn zeroed(harvest_iterations: u32) -> Self {
        Self {
            lanes: [0; L],
            mix_counter: 0,
            bits_collected: 0,
            harvest_iterations,
            sink: Sink::new(),
        }
    }

    /// Absorb one 64-bit value.
    ///
    /// Bumps the mix counter, whitens `sample + counter * GOLDEN_GAMMA` with
    /// [`mix64`], xors it into lane `counter mod L`, then xors that lane
    /// rotated left by 17 into the following lane.
    pub fn feed(&mut self, sample: u64) {
        self.mix_counter = self.mix_counter.wrapping_add(1);

        let z = mix64(sample.wrapping_add(self.mix_counter.wrapping_mul(GOLDEN_GAMMA)));

        let slot = (self.mix_counter % L as u64) as usize;
        self.lanes[slot] ^= z;
        let next = (slot + 1) % L;
        self.lanes[next] ^= self.lanes[slot].rotate_left(CROSS_MIX_ROTATION);

        self.bits_collected = self.bits_collected.saturating_add(FEED_CREDIT_BITS);
    }

    /// Harvest one timing sample from the platform clock.
    pub fn harvest(&mut self) {
        self.harvest_with(&MonotonicClock);
    }

    /// Run the harvest workload, read `timer`, and feed both the raw reading
    /// and the reading xored with the workload result.
    pub fn harvest_with<T: TimerSource + ?Sized>(&mut self, timer: &T) {
        let x = harvest_workload(self.harvest_iterations, &mut self.sink);
        let t = timer.now_ns();
        log::trace!("harvest t={t} counter={}", self.mix_counter);
        self.feed(t);
        self.feed(x ^ t);
    }

    /// Extract 64 bits using the platform clock.
    pub fn extract(&mut self) -> u64 {
        self.extract_with(&MonotonicClock)
    }

    /// Extract 64 bits, harvesting from `timer` once per lane first.
    ///
    /// After the output is computed it is folded back into lanes 0 and 1, so
    /// the post-extraction state no longer combines to the value returned.
    pub fn extract_with<T: TimerSource + ?Sized>(&mut self, timer: &T) -> u64 {
        for _ in 0..L {
            self.harvest_with(timer);
        }

        let out = self.combine();

        self.lanes[0] ^= out.rotate_left(RESEED_ROTATIONS[0]);
        self.lanes[1] ^= out.rotate_left(RESEED_ROTATIONS[1]);

        out
    }

    fn combine(&self) -> u64 {
        self.lanes
            .iter()
            .zip(OUTPUT_ROTATIONS)
            .fold(0, |acc, (&lane, rot)| acc ^ lane.rotate_left(rot))
    }

    /// Number of feeds since creation (wraps at 2^64).
    pub fn mix_counter(&self) -> u64 {
        self.mix_counter
    }

    /// Approximate bits credited so far. Diagnostic only.
    pub fn bits_collected(&self) -> u64 {
        self.bits_collected
    }

    /// Copy of the current lane state, for regression tests and offline
    /// analysis.
    pub fn lanes(&self) -> [u64; L] {
        self.lanes
    }

    /// Lane count.
    pub const fn lane_count(&self) -> usize {
        L
    }

    /// Diagnostic counters as structured data.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            lanes: L,
            mix_counter: self.mix_counter,
            bits_collected: self.bits_collected,
            harvest_iterations: self.harvest_iterations,
        }
    }
}

/// Snapshot of pool diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Lane count.
    pub lanes: usize,
    /// Feeds since creation.
    pub mix_counter: u64,
    /// Approximate bits credited (2 per feed).
    pub bits_collected: u64,
    /// Harvest workload iterations.
    pub harvest_iterations: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    // -----------------------------------------------------------------------
    // Deterministic clock for bit-exact tests
    // -----------------------------------------------------------------------

    /// Clock returning 100, 200, 300, ...
    fn hundreds() -> impl Fn() -> u64 {
        let next = Cell::new(100u64);
        move || {
            let t = next.get();
            next.set(t + 100);
            t
        }
    }

    // -----------------------------------------------------------------------
    // Feed tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_feed_one_two_three_bit_exact() {
        let mut pool = EntropyPool::new();
        pool.feed(1);
        pool.feed(2);
        pool.feed(3);
        assert_eq!(
            pool.lanes(),
            [
                0x18B1_51FA_2A46_6985,
                0x910A_2DEC_8902_5CC1,
                0xE411_5414_B27F_3C56,
                0x34C2_8C58_A8FD_1523,
            ]
        );
        assert_eq!(pool.mix_counter(), 3);
        assert_eq!(pool.bits_collected(), 6);
    }

    #[test]
    fn test_feed_first_touches_lane_one_and_two() {
        let mut pool = EntropyPool::new();
        pool.feed(0);
        let lanes = pool.lanes();
        assert_eq!(lanes[0], 0);
        assert_ne!(lanes[1], 0);
        assert_eq!(lanes[2], lanes[1].rotate_left(17));
        assert_eq!(lanes[3], 0);
    }

    #[test]
    fn test_mix_counter_wraps_at_u64() {
        let mut pool = EntropyPool::new();
        pool.mix_counter = u64::MAX;
        pool.feed(7);
        assert_eq!(pool.mix_counter(), 0);
    }

    #[test]
    fn test_bits_collected_saturates() {
        let mut pool = EntropyPool::new();
        pool.bits_collected = u64::MAX - 1;
        pool.feed(7);
        assert_eq!(pool.bits_collected(), u64::MAX);
    }

    // -----------------------------------------------------------------------
    // Harvest tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_harvest_feeds_twice() {
        let mut pool = EntropyPool::new();
        pool.harvest_with(&|| 12345u64);
        assert_eq!(pool.mix_counter(), 2);
        assert_eq!(pool.bits_collected(), 4);
    }

    #[test]
    fn test_harvest_reads_timer_once() {
        let reads = Cell::new(0);
        let timer = || {
            reads.set(reads.get() + 1);
            1u64
        };
        let mut pool = EntropyPool::new();
        pool.harvest_with(&timer);
        assert_eq!(reads.get(), 1);
    }

    // -----------------------------------------------------------------------
    // Extract tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_extract_bit_exact() {
        let mut pool = EntropyPool::new();
        let out = pool.extract_with(&hundreds());
        assert_eq!(out, 0xE232_851D_1C15_E69D);
        assert_eq!(
            pool.lanes(),
            [
                0x09E5_40D8_D419_B2B6,
                0x252F_56C7_BF31_C901,
                0x6B27_A238_17B9_E685,
                0x346E_B273_7D3B_7C9D,
            ]
        );
        assert_eq!(pool.mix_counter(), 8);
    }

    #[test]
    fn test_extract_harvests_once_per_lane() {
        let mut four = EntropyPool::new();
        four.extract_with(&|| 5u64);
        assert_eq!(four.mix_counter(), 8);

        let mut eight = EntropyPool::<8>::default();
        eight.extract_with(&|| 5u64);
        assert_eq!(eight.mix_counter(), 16);

        let mut two = EntropyPool::<2>::default();
        two.extract_with(&|| 5u64);
        assert_eq!(two.mix_counter(), 4);
    }

    #[test]
    fn test_extract_is_forward_secure() {
        let mut pool = EntropyPool::new();
        let mut shadow = pool.clone();

        let out = pool.extract_with(&hundreds());

        // Replay the same harvests without the reseed step.
        let timer = hundreds();
        for _ in 0..DEFAULT_LANES {
            shadow.harvest_with(&timer);
        }
        let before = shadow.lanes();
        assert_eq!(shadow.combine(), out);

        let after = pool.lanes();
        assert_ne!(after[0], before[0], "lane 0 not reseeded");
        assert_ne!(after[1], before[1], "lane 1 not reseeded");
        assert_eq!(after[2], before[2]);
        assert_eq!(after[3], before[3]);
        assert_eq!(after[0], before[0] ^ out.rotate_left(7));
        assert_eq!(after[1], before[1] ^ out.rotate_left(23));
        assert_ne!(pool.combine(), out, "post-extraction state reveals output");
    }

    #[test]
    fn test_mix_counter_strictly_increases_across_extracts() {
        let mut pool = EntropyPool::new();
        let mut prev = pool.mix_counter();
        for _ in 0..100 {
            pool.extract();
            let now = pool.mix_counter();
            assert!(now > prev);
            prev = now;
        }
    }

    #[test]
    fn test_live_extracts_differ() {
        let mut pool = EntropyPool::new();
        let a = pool.extract();
        let b = pool.extract();
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_clock_same_output() {
        // With the clock fixed, extraction is a pure function of state.
        let mut a = EntropyPool::new();
        let mut b = EntropyPool::new();
        let ta = hundreds();
        let tb = hundreds();
        for _ in 0..10 {
            assert_eq!(a.extract_with(&ta), b.extract_with(&tb));
        }
    }

    // -----------------------------------------------------------------------
    // Config / diagnostics
    // -----------------------------------------------------------------------

    #[test]
    fn test_with_config_rejects_zero_iterations() {
        let config = PhitConfig {
            harvest_iterations: 0,
            ..Default::default()
        };
        assert!(EntropyPool::<4>::with_config(&config).is_err());
    }

    #[test]
    fn test_harvest_iterations_change_output() {
        let config = PhitConfig {
            harvest_iterations: 5,
            ..Default::default()
        };
        let mut short = EntropyPool::<4>::with_config(&config).unwrap();
        let mut long = EntropyPool::new();
        assert_ne!(short.extract_with(&|| 9u64), long.extract_with(&|| 9u64));
    }

    #[test]
    fn test_stats_snapshot() {
        let mut pool = EntropyPool::new();
        pool.harvest_with(&|| 1u64);
        let stats = pool.stats();
        assert_eq!(stats.lanes, 4);
        assert_eq!(stats.mix_counter, 2);
        assert_eq!(stats.bits_collected, 4);
        assert_eq!(stats.harvest_iterations, 20);
        assert_eq!(pool.lane_count(), 4);
    }
}
