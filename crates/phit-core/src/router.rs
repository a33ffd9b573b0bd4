//! Stateless destination routing.
//!
//! `route(k)` maps a freshly taken compound sample onto `[0, k)`. Nothing is
//! shared between callers: no counter, no lock, no atomic. Two threads
//! routing at the same time read the process-wide monotonic clock and
//! nothing else, and their results differ because their workloads finish at
//! different instants. Uniformity is a statistical property of the platform,
//! checked by the distribution tests, not a guarantee.

use crate::error::PhitError;
use crate::sample::compound_sample_with;
use crate::timer::{MonotonicClock, TimerSource};

/// Reads folded per routing decision. Two reads give enough distinct values
/// for uniform bucketing at twice the latency of a single sample.
pub const ROUTE_READS: usize = 2;

/// Pick a destination in `[0, num_destinations)` using the platform clock.
///
/// Returns [`PhitError::NoDestinations`] when `num_destinations` is zero.
pub fn route(num_destinations: usize) -> Result<usize, PhitError> {
    route_with(&MonotonicClock, num_destinations)
}

/// Pick a destination in `[0, num_destinations)` using `timer`.
pub fn route_with<T: TimerSource + ?Sized>(
    timer: &T,
    num_destinations: usize,
) -> Result<usize, PhitError> {
    if num_destinations == 0 {
        return Err(PhitError::NoDestinations);
    }
    let sample = compound_sample_with(timer, ROUTE_READS)?;
    Ok(sample as usize % num_destinations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_route_zero_is_an_error() {
        assert_eq!(route(0), Err(PhitError::NoDestinations));
    }

    #[test]
    fn test_route_zero_does_not_touch_timer() {
        let reads = Cell::new(0);
        let timer = || {
            reads.set(reads.get() + 1);
            0u64
        };
        assert!(route_with(&timer, 0).is_err());
        assert_eq!(reads.get(), 0);
    }

    #[test]
    fn test_route_single_destination() {
        for _ in 0..100 {
            assert_eq!(route(1), Ok(0));
        }
    }

    #[test]
    fn test_route_in_domain() {
        for k in [2usize, 3, 7, 8, 16, 1000, usize::MAX] {
            for _ in 0..200 {
                assert!(route(k).unwrap() < k);
            }
        }
    }

    #[test]
    fn test_route_with_fixed_clock_matches_compound_sample() {
        let next = Cell::new(1000u64);
        let timer = || {
            let t = next.get();
            next.set(t + 1);
            t
        };
        // compound_sample over reads at 1000, 1001 is 0x166944EC.
        assert_eq!(route_with(&timer, 8), Ok(0x1669_44EC % 8));
    }

    #[test]
    fn test_route_uses_two_reads() {
        let reads = Cell::new(0);
        let timer = || {
            reads.set(reads.get() + 1);
            77u64
        };
        route_with(&timer, 4).unwrap();
        assert_eq!(reads.get(), ROUTE_READS);
    }

    #[test]
    fn test_route_from_many_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    let mut counts = [0u32; 4];
                    for _ in 0..2000 {
                        counts[route(4).unwrap()] += 1;
                    }
                    counts
                })
            })
            .collect();
        for h in handles {
            let counts = h.join().unwrap();
            assert_eq!(counts.iter().sum::<u32>(), 2000);
        }
    }
}
