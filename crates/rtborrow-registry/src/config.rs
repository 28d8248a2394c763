//! Registry configuration
//!
//! Picks the storage strategy at runtime:
//!
//! ```json
//! { "strategy": "fixed", "capacity": 16 }
//! ```
//!
//! `{ "strategy": "hashed" }` selects the unbounded hashed registry. A
//! capacity is only accepted together with the fixed strategy.

use crate::fixed::FixedRegistry;
use crate::hashed::HashRegistry;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case", deny_unknown_fields)]
pub enum Strategy {
    // Braced so that unknown fields are rejected like in `Fixed`.
    Hashed {},
    /// At most `capacity` addresses tracked at once
    Fixed { capacity: usize },
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Hashed {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryConfig {
    pub strategy: Strategy,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read registry config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid registry config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("registry capacity must be at least 1")]
    ZeroCapacity,
}

impl RegistryConfig {
    pub fn hashed() -> Self {
        Self::default()
    }

    pub fn fixed(capacity: usize) -> Self {
        Self {
            strategy: Strategy::Fixed { capacity },
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.strategy {
            Strategy::Fixed { capacity: 0 } => Err(ConfigError::ZeroCapacity),
            _ => Ok(()),
        }
    }

    /// Construct the configured registry.
    ///
    /// # Panics
    ///
    /// Panics on a fixed capacity of zero; configs loaded through
    /// [`RegistryConfig::from_json`] never carry one.
    pub fn build(&self) -> Box<dyn Registry> {
        match self.strategy {
            Strategy::Hashed {} => Box::new(HashRegistry::new()),
            Strategy::Fixed { capacity } => Box::new(FixedRegistry::with_capacity(capacity)),
        }
    }
}
