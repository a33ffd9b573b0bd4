//! # phit-core
//!
//! **Randomness from the instant your CPU finishes a tiny piece of work.**
//!
//! `phit-core` reads the platform's monotonic clock right after a short
//! data-dependent arithmetic workload and hashes the reading into a sample.
//! Pipeline, thermal, cache and interrupt noise make the finish instant
//! vary at nanosecond scale. Those samples feed a multi-lane entropy pool,
//! a PRNG façade and a stateless load-balancing router.
//!
//! ## Quick Start
//!
//! ```no_run
//! use phit_core::{PhitRng, route};
//!
//! // PRNG with forward-secure extraction
//! let mut rng = PhitRng::new();
//! let x = rng.next_u64();
//! let mut key = [0u8; 32];
//! rng.fill(&mut key);
//!
//! // Pick one of 8 backends, no shared state between callers
//! let backend = route(8).unwrap();
//! assert!(backend < 8);
//! # let _ = x;
//! ```
//!
//! ## Architecture
//!
//! Timer → Workload → Sample (hash) → Pool (lanes) → PRNG / Router
//!
//! - [`sample`] and [`compound_sample`] turn one or more timer reads into a
//!   32-bit value.
//! - [`EntropyPool`] folds harvested readings into independent lanes and
//!   reseeds itself after every extraction, so earlier outputs cannot be
//!   reconstructed from a later state.
//! - [`PhitRng`] wraps a pool with typed accessors and implements
//!   [`rand::RngCore`].
//! - [`route`] maps a compound sample onto `[0, k)` without any state shared
//!   between callers.
//!
//! None of this is a cryptographically secure RNG. Output quality depends on
//! the platform; run [`self_test`] or the `phit-tests` battery to check a
//! machine.

pub mod calibration;
pub mod config;
pub mod error;
pub mod hash;
pub mod pool;
pub mod prng;
pub mod router;
pub mod sample;
pub mod selftest;
pub mod timer;
pub mod workload;

pub use calibration::{
    MachineInfo, RECOMMENDED_WORKLOAD_NS, TimerProfile, calibrate, detect_machine_info,
    measure_timer_tick, quantize,
};
pub use config::{DEFAULT_SEED_ROUNDS, PhitConfig};
pub use error::PhitError;
pub use hash::{GOLDEN_GAMMA, avalanche32, mix64};
pub use pool::{DEFAULT_LANES, EntropyPool, PoolStats};
pub use prng::PhitRng;
pub use router::{ROUTE_READS, route, route_with};
pub use sample::{
    SampleStream, compound_sample, compound_sample_with, sample, sample_key, sample_with,
    samples_to_bytes,
};
pub use selftest::{SelfTestCheck, SelfTestReport, self_test};
pub use timer::{MonotonicClock, TimerSource, now_ns};
pub use workload::{DEFAULT_HARVEST_ITERATIONS, Sink};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
