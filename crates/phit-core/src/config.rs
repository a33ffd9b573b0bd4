//! Runtime tuning knobs for the pool and PRNG.
//!
//! The lane count is a const generic on [`EntropyPool`](crate::EntropyPool);
//! everything else that a deployment might want to tune lives here.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PhitError;
use crate::workload::DEFAULT_HARVEST_ITERATIONS;

/// Harvest rounds performed by [`PhitRng`](crate::PhitRng) before first use.
pub const DEFAULT_SEED_ROUNDS: u32 = 16;

/// Pool and PRNG configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhitConfig {
    /// Iterations of the harvest workload per timer read.
    pub harvest_iterations: u32,
    /// Harvests run when a PRNG is created, before any output is returned.
    pub seed_rounds: u32,
}

impl Default for PhitConfig {
    fn default() -> Self {
        Self {
            harvest_iterations: DEFAULT_HARVEST_ITERATIONS,
            seed_rounds: DEFAULT_SEED_ROUNDS,
        }
    }
}

impl PhitConfig {
    /// Check every field against its valid domain.
    pub fn validate(&self) -> Result<(), PhitError> {
        if self.harvest_iterations == 0 {
            return Err(PhitError::InvalidConfig(
                "harvest_iterations must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> std::io::Result<Self> {
        let config = serde_json::from_str::<Self>(raw).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("failed to parse phit config JSON: {e}"),
            )
        })?;
        config
            .validate()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        Ok(config)
    }

    /// Load a JSON config from disk.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
