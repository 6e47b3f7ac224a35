//! Sampler configuration
//!
//! Loaded from JSON (every field optional) and then overridden by CLI flags.

use crate::errors::{DecipherError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MAX_ACCEPTED: u64 = 4000;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Knobs for one Metropolis-Hastings run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    /// Accepted moves after which the chain stops
    pub max_accepted: u64,
    /// Optional cap on total proposals, for chains whose acceptance rate collapses
    pub max_attempts: Option<u64>,
    /// Attempts between progress reports (0 disables them)
    pub progress_interval: u64,
    /// Fixed seed for reproducible runs; fresh entropy when absent
    pub rng_seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            max_accepted: DEFAULT_MAX_ACCEPTED,
            max_attempts: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            rng_seed: None,
        }
    }
}

impl SamplerConfig {
    /// Read a config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: SamplerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the sampler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_accepted == 0 {
            return Err(DecipherError::InvalidConfig(
                "max_accepted must be at least 1".into(),
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(DecipherError::InvalidConfig(
                "max_attempts must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    /// Random source for a run: seeded if `rng_seed` is set
    pub fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_max_accepted(mut self, max_accepted: u64) -> Self {
        self.max_accepted = max_accepted;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }
}
