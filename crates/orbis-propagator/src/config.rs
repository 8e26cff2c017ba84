//! Serializable propagation settings.
//!
//! [`PropagationConfig`] captures the interval and sampling settings of a
//! propagator so they can be kept in a TOML file and applied in one call.
//! [`validate()`](PropagationConfig::validate) checks the same invariants
//! a run checks, but up front.

use std::path::{Path, PathBuf};

use log::info;
use orbis_core::{ConfigurationError, PropagationError, TimeValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::base::PropagatorBase;
use crate::interval::PropagationInterval;

/// Interval and sampling settings for one propagator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Start of the propagation interval. Default: 0.
    pub interval_start: TimeValue,
    /// End of the propagation interval. Default: 0.
    pub interval_end: TimeValue,
    /// Sampling interval; 0 keeps final states only. Default: 0.
    pub fixed_output_interval: TimeValue,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            interval_start: 0.0,
            interval_end: 0.0,
            fixed_output_interval: 0.0,
        }
    }
}

impl PropagationConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("loaded propagation config from {}", path.display());
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The configured interval.
    pub fn interval(&self) -> PropagationInterval {
        PropagationInterval::new(self.interval_start, self.interval_end)
    }

    /// Check interval bounds and the sampling interval.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.interval().validate()?;
        if !self.fixed_output_interval.is_finite() || self.fixed_output_interval < 0.0 {
            return Err(ConfigurationError::InvalidOutputInterval {
                value: self.fixed_output_interval,
            });
        }
        Ok(())
    }

    /// Copy these settings into a propagator's base.
    pub fn apply(&self, base: &mut PropagatorBase) -> Result<(), PropagationError> {
        self.validate()?;
        base.set_propagation_interval_start(self.interval_start);
        base.set_propagation_interval_end(self.interval_end);
        base.set_fixed_output_interval(self.fixed_output_interval)
    }

    /// Capture the settings currently held by a propagator's base.
    pub fn from_base(base: &PropagatorBase) -> Self {
        Self {
            interval_start: base.propagation_interval_start(),
            interval_end: base.propagation_interval_end(),
            fixed_output_interval: base.fixed_output_interval().unwrap_or(0.0),
        }
    }
}

/// Errors from loading a [`PropagationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid TOML for this schema.
    #[error("cannot parse propagation config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be rendered as TOML.
    #[error("cannot render propagation config: {0}")]
    Render(#[from] toml::ser::Error),

    /// The settings parsed but violate an invariant.
    #[error("invalid propagation config: {0}")]
    Invalid(#[from] ConfigurationError),
}
