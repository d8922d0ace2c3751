//! # Epsilon Engine
//!
//! Facade over [`epsilon_core`]: the runtime plus the services every game
//! built on it needs.
//!
//! ## Contents
//!
//! - [`LoggingManager`] - installs the log subscriber, hands out named [`Logger`]s
//! - [`EngineConfig`] - `[world]` and `[logging]` sections of one TOML file
//!
//! ## Example
//!
//! ```rust,no_run
//! use epsilon_engine::{EngineConfig, LoggingManager};
//!
//! let config = EngineConfig::load("engine.toml")?;
//! let mut world = config.build_world()?;
//! world.init()?;
//!
//! if let Some(logging) = world.get_manager::<LoggingManager>() {
//!     if let Some(logger) = logging.logger("LoggingManager") {
//!         logger.info("engine ready");
//!     }
//! }
//! # Ok::<(), epsilon_engine::EcsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod logging;

pub use epsilon_core;
pub use epsilon_core::{
    Component, ComponentHandle, EcsError, EcsResult, Entity, EntityId, HookResult, Manager,
    ManagerKey, System, World, WorldConfig,
};

pub use config::EngineConfig;
pub use logging::{Logger, LoggingConfig, LoggingManager, MANAGER_LOGGER};
