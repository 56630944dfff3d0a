//! Configuration for batch runs.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QUAVER_ prefix, plus `SLURM_CPUS_PER_TASK`)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::warn;

use crate::error::ConfigError;

/// Environment variable a batch scheduler sets to the CPU allocation.
pub const SLURM_CPUS_VAR: &str = "SLURM_CPUS_PER_TASK";

/// Largest accepted `max_workers`.
pub const MAX_WORKERS: usize = Semaphore::MAX_PERMITS;

/// Settings for a [`BatchProcessor`](crate::BatchProcessor) run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Samples per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Measurement shots per estimate
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Upper bound on concurrent workers; detected when unset
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Base seed for per-chunk RNGs; drawn from entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,

    /// Zero-pad the final chunk up to `chunk_size`
    #[serde(default)]
    pub pad_last_chunk: bool,
}

fn default_chunk_size() -> usize {
    64
}

fn default_shots() -> u32 {
    10_000
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            chunk_size: default_chunk_size(),
            shots: default_shots(),
            max_workers: None,
            seed: None,
            pad_last_chunk: false,
        }
    }
}

impl StreamConfig {
    /// Load and validate configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;

        serde_yaml_ng::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    /// 3. Validate the merged result
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// [`StreamConfig::load`] with variables resolved by `lookup`.
    pub fn load_with<F>(config_file: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match config_file {
            Some(path) => Self::read_file(path)?,
            None => StreamConfig::default(),
        };

        let config = config.merge_env_from(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Merge process environment variables into this configuration.
    pub fn merge_env(self) -> Self {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge variables resolved by `lookup` into this configuration.
    ///
    /// Only variables that are present override the current values; values
    /// that fail to parse are ignored. `SLURM_CPUS_PER_TASK` fills
    /// `max_workers` only when neither the file nor `QUAVER_MAX_WORKERS`
    /// set it.
    pub fn merge_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("QUAVER_CHUNK_SIZE").and_then(|v| v.parse().ok()) {
            self.chunk_size = val;
        }
        if let Some(val) = lookup("QUAVER_SHOTS").and_then(|v| v.parse().ok()) {
            self.shots = val;
        }
        if let Some(val) = lookup("QUAVER_SEED").and_then(|v| v.parse().ok()) {
            self.seed = Some(val);
        }
        if let Some(val) = lookup("QUAVER_MAX_WORKERS").and_then(|v| v.parse().ok()) {
            self.max_workers = Some(val);
        } else if self.max_workers.is_none() {
            if let Some(val) = lookup(SLURM_CPUS_VAR).and_then(|v| v.parse().ok()) {
                self.max_workers = Some(val);
            }
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.shots == 0 {
            return Err(ConfigError::ValidationError(
                "shots must be greater than 0".to_string(),
            ));
        }
        if let Some(n) = self.max_workers {
            if n > MAX_WORKERS {
                return Err(ConfigError::ValidationError(format!(
                    "max_workers must be at most {MAX_WORKERS}, got {n}"
                )));
            }
        }
        Ok(())
    }

    /// Number of workers a run will use.
    ///
    /// `max_workers` when set (0 is treated as 1, values above
    /// [`MAX_WORKERS`] are capped), otherwise the available parallelism of
    /// the host.
    pub fn workers(&self) -> usize {
        match self.max_workers {
            Some(0) => {
                warn!("max_workers = 0, using a single worker");
                1
            }
            Some(n) => n.min(MAX_WORKERS),
            None => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }
}
