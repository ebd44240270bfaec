//! Solver hyperparameters.
//!
//! The defaults are the historic fixed values. A [`SolverConfig`] is handed to the solver at
//! construction and can come from a TOML file, CLI flags, or both.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 1e-6;

/// Hyperparameters for projected gradient descent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Upper bound on gradient steps. Reaching it is normal termination.
    pub max_iterations: usize,
    /// Step size applied to the squared-error gradient.
    pub learning_rate: f64,
    /// The loop stops once successive reconstruction distances differ by less than this.
    pub convergence_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            learning_rate: DEFAULT_LEARNING_RATE,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write solver config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML solver config: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize solver config to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid solver config: {0}")]
    Invalid(String),
}

impl SolverConfig {
    /// Loads a config from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&toml_string)?;
        config.validate()?;
        log::debug!("Loaded solver config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "learning_rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "convergence_threshold must be a non-negative finite number, got {}",
                self.convergence_threshold
            )));
        }
        Ok(())
    }
}
