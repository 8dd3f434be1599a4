//! Manager configuration.

use std::path::Path;
use std::time::Duration;

use neo_mixer_crypto::hd::{MAX_SEED_SIZE, MIN_SEED_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{TeeError, TeeResult};

/// Default root seed size in bytes
pub const DEFAULT_SEED_SIZE: usize = 32;

/// Default number of cached pool keys
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Default attestation freshness window
pub const DEFAULT_ATTESTATION_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`SealedTeeManager`](crate::SealedTeeManager)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeeManagerConfig {
    /// Size of a freshly generated root seed
    pub seed_size: usize,
    /// Maximum number of derived keys kept in memory
    pub cache_size: usize,
    /// Maximum age of a timestamped attestation
    pub attestation_timeout_secs: u64,
}

impl Default for TeeManagerConfig {
    fn default() -> Self {
        Self {
            seed_size: DEFAULT_SEED_SIZE,
            cache_size: DEFAULT_CACHE_SIZE,
            attestation_timeout_secs: DEFAULT_ATTESTATION_TIMEOUT_SECS,
        }
    }
}

impl TeeManagerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> TeeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| TeeError::Config(e.to_string()))?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> TeeResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| TeeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Replaces zero values with the defaults.
    pub fn normalized(mut self) -> Self {
        if self.seed_size == 0 {
            self.seed_size = DEFAULT_SEED_SIZE;
        }
        if self.cache_size == 0 {
            self.cache_size = DEFAULT_CACHE_SIZE;
        }
        if self.attestation_timeout_secs == 0 {
            self.attestation_timeout_secs = DEFAULT_ATTESTATION_TIMEOUT_SECS;
        }
        self
    }

    pub fn validate(&self) -> TeeResult<()> {
        if !(MIN_SEED_SIZE..=MAX_SEED_SIZE).contains(&self.seed_size) {
            return Err(TeeError::Config(format!(
                "seed_size {} is outside {MIN_SEED_SIZE}..={MAX_SEED_SIZE}",
                self.seed_size
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn attestation_timeout(&self) -> Duration {
        Duration::from_secs(self.attestation_timeout_secs)
    }
}
