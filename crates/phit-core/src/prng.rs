//! Pseudo-random generator backed by an [`EntropyPool`].
//!
//! Every output draws fresh timing samples (one harvest per pool lane) before
//! it is produced, so the generator is slow compared to a seeded PRNG but
//! never runs on stale state. It is **not** a cryptographic RNG and does not
//! implement `rand::CryptoRng`.

use rand::RngCore;

use crate::config::{DEFAULT_SEED_ROUNDS, PhitConfig};
use crate::error::PhitError;
use crate::pool::EntropyPool;
use crate::timer::{MonotonicClock, TimerSource};

/// 2^-53, the spacing of doubles in `[0.5, 1)`.
const F64_UNIT: f64 = 1.0 / (1u64 << 53) as f64;

/// Phit PRNG: an owned pool plus typed accessors.
///
/// ```no_run
/// use phit_core::PhitRng;
///
/// let mut rng = PhitRng::new();
/// let die = rng.next_range(6).unwrap() + 1;
/// assert!((1..=6).contains(&die));
///
/// let mut key = [0u8; 32];
/// rng.fill(&mut key);
/// ```
#[derive(Debug, Clone)]
pub struct PhitRng<T = MonotonicClock> {
    pool: EntropyPool,
    generated: u64,
    timer: T,
}

impl PhitRng {
    /// Create a generator on the platform clock, seeded with
    /// [`DEFAULT_SEED_ROUNDS`] harvests.
    pub fn new() -> Self {
        Self::seeded(MonotonicClock, EntropyPool::new(), DEFAULT_SEED_ROUNDS)
    }

    /// Create a generator on the platform clock from `config`.
    pub fn with_config(config: &PhitConfig) -> Result<Self, PhitError> {
        Self::with_timer(MonotonicClock, config)
    }
}

impl Default for PhitRng {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimerSource> PhitRng<T> {
    /// Create a generator on a caller-supplied clock.
    pub fn with_timer(timer: T, config: &PhitConfig) -> Result<Self, PhitError> {
        let pool = EntropyPool::with_config(config)?;
        Ok(Self::seeded(timer, pool, config.seed_rounds))
    }

    fn seeded(timer: T, mut pool: EntropyPool, rounds: u32) -> Self {
        for _ in 0..rounds {
            pool.harvest_with(&timer);
        }
        log::debug!(
            "seeded phit rng: {rounds} rounds, mix_counter={}",
            pool.mix_counter()
        );
        Self {
            pool,
            generated: 0,
            timer,
        }
    }

    /// Next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.generated = self.generated.wrapping_add(1);
        self.pool.extract_with(&self.timer)
    }

    /// Next 32-bit value, taken from the high half of [`next_u64`](Self::next_u64).
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform double in `[0, 1)` built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * F64_UNIT
    }

    /// Integer in `[0, max)`.
    ///
    /// Plain modulo reduction: for `max` not dividing 2^64 the low residues
    /// are favoured by at most `max / 2^64`, which is accepted here.
    /// Returns [`PhitError::EmptyRange`] when `max` is zero.
    pub fn next_range(&mut self, max: u32) -> Result<u32, PhitError> {
        if max == 0 {
            return Err(PhitError::EmptyRange);
        }
        Ok((self.next_u64() % u64::from(max)) as u32)
    }

    /// Fill `dest` with output, eight little-endian bytes per value. A
    /// trailing partial chunk uses the low bytes of one extra value.
    pub fn fill(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    /// Values produced since creation. Diagnostic only.
    pub fn generated(&self) -> u64 {
        self.generated
    }

    /// The underlying pool.
    pub fn pool(&self) -> &EntropyPool {
        &self.pool
    }
}

impl<T: TimerSource> RngCore for PhitRng<T> {
    fn next_u32(&mut self) -> u32 {
        PhitRng::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        PhitRng::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.fill(dest);
    }
}
