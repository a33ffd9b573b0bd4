//! Monotonic nanosecond clock.
//!
//! Everything in this crate that reads time goes through [`TimerSource`], so
//! callers can substitute their own clock and tests can drive the pool with a
//! deterministic one. [`MonotonicClock`] is the platform default.

/// A monotonic, non-decreasing nanosecond clock.
///
/// Resolution and backing hardware are platform-specific; implementors only
/// promise that successive reads never go backwards and are cheap to take.
pub trait TimerSource {
    /// Current reading in nanoseconds.
    fn now_ns(&self) -> u64;
}

impl<F> TimerSource for F
where
    F: Fn() -> u64,
{
    fn now_ns(&self) -> u64 {
        self()
    }
}

/// The platform's raw monotonic clock.
///
/// - Linux/Android: `CLOCK_MONOTONIC_RAW` (not slewed by NTP)
/// - macOS/iOS: `CLOCK_UPTIME_RAW`
/// - other Unix: `CLOCK_MONOTONIC`
/// - elsewhere: `std::time::Instant` relative to a process-local epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonotonicClock;

impl TimerSource for MonotonicClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        now_ns()
    }
}

/// Read the platform monotonic clock in nanoseconds.
#[cfg(unix)]
#[inline]
pub fn now_ns() -> u64 {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    const CLOCK: libc::clockid_t = libc::CLOCK_MONOTONIC_RAW;
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    const CLOCK: libc::clockid_t = libc::CLOCK_UPTIME_RAW;
    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "macos",
        target_os = "ios"
    )))]
    const CLOCK: libc::clockid_t = libc::CLOCK_MONOTONIC;

    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: clock_gettime only writes into the timespec we own; the clock
    // id is a compile-time constant supported on this target.
    let rc = unsafe { libc::clock_gettime(CLOCK, &mut ts) };
    let reading = (rc == 0).then(|| {
        (ts.tv_sec as u64)
            .wrapping_mul(1_000_000_000)
            .wrapping_add(ts.tv_nsec as u64)
    });
    settle(reading)
}

#[cfg(unix)]
thread_local! {
    static LAST_NS: std::cell::Cell<u64> = const { std::cell::Cell::new(0) };
}

/// Record a successful reading, or repeat this thread's last one.
///
/// `clock_gettime` only fails for an unsupported clock id or a bad pointer,
/// neither of which can happen here. Should it fail anyway, the caller gets
/// the previous reading from the same clock, which keeps reads non-decreasing.
#[cfg(unix)]
#[inline]
fn settle(reading: Option<u64>) -> u64 {
    LAST_NS.with(|last| match reading {
        Some(ns) => {
            last.set(ns);
            ns
        }
        None => last.get(),
    })
}

#[cfg(not(unix))]
#[inline]
pub fn now_ns() -> u64 {
    epoch_ns()
}

/// Nanoseconds since a process-local epoch taken on first use.
#[cfg(not(unix))]
fn epoch_ns() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}
