//! Runtime configuration for the allocator and its HTTP host.

use crate::error::ConfigError;
use crate::policy::{LinearDistancePolicy, SeparationPolicy, StrictBenchPolicy};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV: &str = "SEAT_ALLOCATOR_CONFIG";

/// Tuning knobs for the seat allocation engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeatingConfig {
    /// Same-subject seat distance the first placement pass aims for.
    pub preferred_distance: u32,
    /// Same-subject seat distance the second placement pass accepts.
    pub min_distance: u32,
    /// Reject same-subject neighbours sharing a bench or a bench column.
    pub strict_mode: bool,
    pub benches_per_row: u32,
    /// Upper bound on placement rounds per pass.
    pub max_rounds: usize,
    /// Fixed RNG seed; fresh entropy per call when absent.
    pub seed: Option<u64>,
}

impl Default for SeatingConfig {
    fn default() -> Self {
        Self {
            preferred_distance: 3,
            min_distance: 2,
            strict_mode: true,
            benches_per_row: 4,
            max_rounds: 200,
            seed: None,
        }
    }
}

impl SeatingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_distance == 0 {
            return Err(ConfigError::Invalid("min_distance must be at least 1".into()));
        }
        if self.preferred_distance < self.min_distance {
            return Err(ConfigError::Invalid(format!(
                "preferred_distance ({}) must not be below min_distance ({})",
                self.preferred_distance, self.min_distance
            )));
        }
        if self.benches_per_row == 0 {
            return Err(ConfigError::Invalid("benches_per_row must be at least 1".into()));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid("max_rounds must be at least 1".into()));
        }
        Ok(())
    }

    /// The separation rule selected by `strict_mode`.
    pub fn separation_policy(&self) -> Box<dyn SeparationPolicy> {
        if self.strict_mode {
            Box::new(StrictBenchPolicy::new(self.benches_per_row))
        } else {
            Box::new(LinearDistancePolicy::new(self.min_distance))
        }
    }

    /// Round cap for one placement pass in a room of `capacity` seats.
    pub fn round_cap(&self, capacity: u32) -> usize {
        (capacity as usize * 2).min(self.max_rounds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub seating: SeatingConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.seating.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reads the file named by `SEAT_ALLOCATOR_CONFIG`, or falls back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
