//! # World Configuration
//!
//! Loaded once at startup, usually from the `[world]` table of a TOML file:
//!
//! ```toml
//! name = "arena"
//! workers = 4
//! ```

use std::path::Path;
use std::thread;

use serde::Deserialize;

use crate::error::{EcsError, EcsResult};

/// Configuration for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Name used in log output.
    pub name: String,
    /// Size of the worker pool running system hooks.
    pub workers: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "world".to_string(),
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

impl WorldConfig {
    /// Default configuration with a fixed worker count.
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] on malformed TOML, unknown keys or
    /// invalid values.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| EcsError::InvalidConfig(format!("failed to parse world config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EcsError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if `workers` is zero.
    pub fn validate(&self) -> EcsResult<()> {
        if self.workers == 0 {
            return Err(EcsError::InvalidConfig("workers must be at least 1".to_string()));
        }
        Ok(())
    }
}
