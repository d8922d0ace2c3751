//! # Logging Manager
//!
//! Installs the process-wide `tracing` subscriber and hands out named
//! loggers to systems and other managers.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! file = "engine.log"
//! ```
//!
//! The log file is truncated when the manager initializes. Without a file,
//! events go to stderr.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::Level;

use epsilon_core::{EcsError, EcsResult, HookResult, Manager, World};

/// Name of the logger created by [`LoggingManager`] itself.
pub const MANAGER_LOGGER: &str = "LoggingManager";

/// Logging section of the engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Maximum level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Log file, truncated on startup. Unset by default, logging to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parses the configured level.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the level is not a known name.
    pub fn max_level(&self) -> EcsResult<Level> {
        self.level
            .parse::<Level>()
            .map_err(|_| EcsError::InvalidConfig(format!("unknown log level '{}'", self.level)))
    }
}

/// A named logger.
///
/// Every event carries a `logger` field holding the name, so output of
/// different subsystems can be told apart in a shared log file. Messages are
/// anything `Display`, including `format_args!` output, so formatting
/// allocates nothing when the level is disabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logger {
    name: Arc<str>,
}

impl Logger {
    fn new(name: &str) -> Self {
        Self { name: Arc::from(name) }
    }

    /// The logger's name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logs at `TRACE`.
    pub fn trace(&self, message: impl fmt::Display) {
        tracing::trace!(logger = %self.name, "{}", message);
    }

    /// Logs at `DEBUG`.
    pub fn debug(&self, message: impl fmt::Display) {
        tracing::debug!(logger = %self.name, "{}", message);
    }

    /// Logs at `INFO`.
    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(logger = %self.name, "{}", message);
    }

    /// Logs at `WARN`.
    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(logger = %self.name, "{}", message);
    }

    /// Logs at `ERROR`.
    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(logger = %self.name, "{}", message);
    }
}

/// Manager owning the log subscriber and the named loggers.
///
/// # Example
///
/// ```rust,no_run
/// use epsilon_core::World;
/// use epsilon_engine::{LoggingConfig, LoggingManager};
///
/// let mut world = World::with_workers(2)?;
/// world.add_manager(LoggingManager::new(LoggingConfig::default()))?;
/// world.init()?;
///
/// let physics = world
///     .get_manager_mut::<LoggingManager>()
///     .map(|mut logging| logging.new_logger("physics"));
/// if let Some(physics) = physics {
///     physics.info("physics ready");
/// }
/// # Ok::<(), epsilon_core::EcsError>(())
/// ```
#[derive(Debug, Default)]
pub struct LoggingManager {
    config: LoggingConfig,
    loggers: HashMap<String, Logger>,
    subscriber_set_up: bool,
    installed: bool,
}

impl LoggingManager {
    /// Creates a manager; nothing is installed before `init`.
    #[must_use]
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config,
            loggers: HashMap::new(),
            subscriber_set_up: false,
            installed: false,
        }
    }

    /// Creates the logger `name`, replacing any logger of the same name.
    pub fn new_logger(&mut self, name: &str) -> Logger {
        let logger = Logger::new(name);
        self.loggers.insert(name.to_string(), logger.clone());
        logger
    }

    /// The logger registered as `name`.
    #[must_use]
    pub fn logger(&self, name: &str) -> Option<Logger> {
        self.loggers.get(name).cloned()
    }

    /// Names of every registered logger, unordered.
    pub fn logger_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.loggers.keys().map(String::as_str)
    }

    /// Returns `true` if `init` installed the global subscriber. `false`
    /// when another subscriber was already in place.
    #[inline]
    #[must_use]
    pub const fn is_installed(&self) -> bool {
        self.installed
    }

    /// The configuration the manager was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &LoggingConfig {
        &self.config
    }

    fn install(&self) -> EcsResult<bool> {
        let level = self.config.max_level()?;
        let builder = tracing_subscriber::fmt().with_max_level(level).with_target(false);

        let installed = match &self.config.file {
            Some(path) => {
                let file = File::create(path).map_err(|e| {
                    EcsError::InvalidConfig(format!("cannot create log file {}: {e}", path.display()))
                })?;
                builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init()
            }
            None => builder.with_writer(std::io::stderr).try_init(),
        };

        match installed {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!("Keeping the existing log subscriber: {}", e);
                Ok(false)
            }
        }
    }
}

impl Manager for LoggingManager {
    /// Sets the subscriber up once. A retried `World::init` keeps the
    /// subscriber and the log file of the first attempt.
    fn init(&mut self, _world: &World) -> HookResult {
        if self.subscriber_set_up {
            return Ok(());
        }
        self.installed = self.install()?;
        self.subscriber_set_up = true;
        Ok(())
    }

    fn after_init(&mut self, _world: &World) -> HookResult {
        let logger = self.new_logger(MANAGER_LOGGER);
        logger.info("LoggingManager started!");
        Ok(())
    }

    fn stop(&mut self, _world: &World) -> HookResult {
        if let Some(logger) = self.logger(MANAGER_LOGGER) {
            logger.info("LoggingManager stopped");
        }
        Ok(())
    }
}
