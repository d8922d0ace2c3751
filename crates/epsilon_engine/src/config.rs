//! # Engine Configuration
//!
//! One TOML file configures the world and its logging:
//!
//! ```toml
//! [world]
//! name = "arena"
//! workers = 4
//!
//! [logging]
//! level = "info"
//! file = "engine.log"
//! ```
//!
//! Every section and key is optional.

use std::path::Path;

use serde::Deserialize;

use epsilon_core::{EcsError, EcsResult, World, WorldConfig};

use crate::logging::{LoggingConfig, LoggingManager};

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// `[world]` section.
    pub world: WorldConfig,
    /// `[logging]` section.
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Parses and validates a configuration from TOML.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] on malformed TOML, unknown keys, a zero
    /// worker count or an unknown log level.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| EcsError::InvalidConfig(format!("failed to parse engine config: {e}")))?;
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

    /// Validates both sections.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] describing the first invalid value.
    pub fn validate(&self) -> EcsResult<()> {
        self.world.validate()?;
        self.logging.max_level()?;
        Ok(())
    }

    /// Builds an uninitialized world with a [`LoggingManager`] registered.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the world section does not validate.
    pub fn build_world(&self) -> EcsResult<World> {
        let mut world = World::with_config(self.world.clone())?;
        world.add_manager(LoggingManager::new(self.logging.clone()))?;
        Ok(world)
    }
}
