//! Sample extractor: workload, timer read, hash.
//!
//! A basic sample runs the fixed-cost workload, reads the timer immediately
//! afterwards and hashes the timer's low bits together with the workload
//! state. A compound sample folds several such reads into one value, trading
//! latency for more distinguishable outputs.
//!
//! Output quality is a measured, platform-specific property. Nothing here
//! asserts an entropy figure; use [`SampleStream`] to feed raw samples to an
//! external statistical battery instead.

use crate::error::PhitError;
use crate::hash::{GOLDEN_GAMMA, avalanche32};
use crate::timer::{MonotonicClock, TimerSource};
use crate::workload::{SAMPLE_SEED, Sink, sample_workload};

/// Rotation applied to the compound accumulator after every fold.
const FOLD_ROTATION: u32 = 7;

/// Build the 32-bit key from a timer reading and the workload result.
///
/// Bits 0–1 hold the timer's two lowest bits; bits 2 and up hold
/// `(t >> 2) ^ workload`, truncated to 32 bits.
#[inline]
pub const fn sample_key(t: u64, workload: u64) -> u32 {
    ((t & 0x3) as u32) | ((((t >> 2) as u32) ^ (workload as u32)) << 2)
}

/// One phit sample from the platform clock.
pub fn sample() -> u32 {
    sample_with(&MonotonicClock)
}

/// One phit sample from `timer`.
pub fn sample_with<T: TimerSource + ?Sized>(timer: &T) -> u32 {
    let mut sink = Sink::new();
    let x = sample_workload(SAMPLE_SEED, &mut sink);
    let t = timer.now_ns();
    avalanche32(sample_key(t, x))
}

/// Fold `reads` sequential samples from the platform clock into one.
///
/// Costs `reads` workload executions. Returns [`PhitError::NoReads`] when
/// `reads` is zero.
pub fn compound_sample(reads: usize) -> Result<u32, PhitError> {
    compound_sample_with(&MonotonicClock, reads)
}

/// Fold `reads` sequential samples from `timer` into one.
pub fn compound_sample_with<T: TimerSource + ?Sized>(
    timer: &T,
    reads: usize,
) -> Result<u32, PhitError> {
    if reads == 0 {
        return Err(PhitError::NoReads);
    }
    let mut sink = Sink::new();
    let mut acc = 0u32;
    for i in 0..reads {
        // Vary the workload per read so consecutive reads differ in data flow.
        let seed = SAMPLE_SEED ^ (i as u64).wrapping_mul(GOLDEN_GAMMA);
        let x = sample_workload(seed, &mut sink);
        let t = timer.now_ns();
        let key = sample_key(t, x);
        acc ^= avalanche32(key.wrapping_add(i as u32));
        acc = acc.rotate_left(FOLD_ROTATION);
    }
    Ok(avalanche32(acc))
}

/// Endless stream of basic (`reads == 1`) or compound samples.
///
/// ```no_run
/// use phit_core::SampleStream;
///
/// let raw: Vec<u32> = SampleStream::new(2).unwrap().take(1024).collect();
/// assert_eq!(raw.len(), 1024);
/// ```
#[derive(Debug, Clone)]
pub struct SampleStream<T = MonotonicClock> {
    timer: T,
    reads: usize,
}

impl SampleStream {
    /// Stream from the platform clock.
    pub fn new(reads: usize) -> Result<Self, PhitError> {
        Self::with_timer(MonotonicClock, reads)
    }
}

impl<T: TimerSource> SampleStream<T> {
    /// Stream from a caller-supplied clock.
    pub fn with_timer(timer: T, reads: usize) -> Result<Self, PhitError> {
        if reads == 0 {
            return Err(PhitError::NoReads);
        }
        Ok(Self { timer, reads })
    }

    /// Reads folded into each yielded sample.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl<T: TimerSource> Iterator for SampleStream<T> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.reads == 1 {
            Some(sample_with(&self.timer))
        } else {
            compound_sample_with(&self.timer, self.reads).ok()
        }
    }
}

/// Serialize samples as little-endian bytes for byte-oriented test suites.
pub fn samples_to_bytes(samples: &[u32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    /// Clock that returns `start`, `start + step`, ...
    fn stepping_timer(start: u64, step: u64) -> impl Fn() -> u64 {
        let next = Cell::new(start);
        move || {
            let t = next.get();
            next.set(t + step);
            t
        }
    }

    // -----------------------------------------------------------------------
    // Key construction
    // -----------------------------------------------------------------------

    #[test]
    fn test_sample_key_layout() {
        assert_eq!(sample_key(0b11, 0), 0b11);
        assert_eq!(sample_key(0b100, 0), 0b100);
        assert_eq!(sample_key(0, 1), 0b100);
        // Bits 2+ cancel when the workload matches t >> 2.
        assert_eq!(sample_key(0x0000_0005 << 2 | 0b10, 5), 0b10);
    }

    #[test]
    fn test_sample_key_truncates_to_32_bits() {
        let k = sample_key(u64::MAX, 0);
        assert_eq!(k, u32::MAX);
    }

    // -----------------------------------------------------------------------
    // Deterministic clock vectors
    // -----------------------------------------------------------------------

    #[test]
    fn test_sample_with_fixed_clock() {
        let timer = || 1000u64;
        assert_eq!(sample_with(&timer), 0x32A9_A90F);
    }

    #[test]
    fn test_compound_sample_with_stepping_clock() {
        let timer = stepping_timer(1000, 1);
        assert_eq!(compound_sample_with(&timer, 2).unwrap(), 0x1669_44EC);
    }

    #[test]
    fn test_compound_sample_zero_reads_rejected() {
        let timer = || 0u64;
        assert_eq!(compound_sample_with(&timer, 0), Err(PhitError::NoReads));
        assert_eq!(compound_sample(0), Err(PhitError::NoReads));
    }

    #[test]
    fn test_compound_sample_reads_timer_once_per_fold() {
        let reads = Cell::new(0u32);
        let timer = || {
            reads.set(reads.get() + 1);
            42u64
        };
        compound_sample_with(&timer, 5).unwrap();
        assert_eq!(reads.get(), 5);
    }

    // -----------------------------------------------------------------------
    // Live clock
    // -----------------------------------------------------------------------

    #[test]
    fn test_live_samples_vary() {
        let distinct: HashSet<u32> = (0..1000).map(|_| sample()).collect();
        assert!(distinct.len() > 1, "1000 live samples were all identical");
    }

    #[test]
    fn test_live_compound_samples_vary() {
        let compound: HashSet<u32> = (0..2000).map(|_| compound_sample(2).unwrap()).collect();
        assert!(compound.len() > 1);
    }

    // -----------------------------------------------------------------------
    // Stream
    // -----------------------------------------------------------------------

    #[test]
    fn test_stream_rejects_zero_reads() {
        assert!(matches!(SampleStream::new(0), Err(PhitError::NoReads)));
    }

    #[test]
    fn test_stream_matches_free_functions() {
        let stream = SampleStream::with_timer(|| 1000u64, 1).unwrap();
        let values: Vec<u32> = stream.take(3).collect();
        assert_eq!(values, vec![0x32A9_A90F; 3]);

        let mut stream = SampleStream::with_timer(stepping_timer(1000, 1), 2).unwrap();
        assert_eq!(stream.reads(), 2);
        assert_eq!(stream.next(), Some(0x1669_44EC));
    }

    #[test]
    fn test_samples_to_bytes_little_endian() {
        let bytes = samples_to_bytes(&[0x0403_0201, 0x0807_0605]);
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
