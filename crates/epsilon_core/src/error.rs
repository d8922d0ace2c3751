//! # Runtime Error Types
//!
//! All errors that can occur while building or driving a [`World`].
//!
//! [`World`]: crate::World

use std::fmt;

use thiserror::Error;

/// Boxed error returned by system and manager hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type of every lifecycle hook.
pub type HookResult = Result<(), BoxError>;

/// Result type for runtime operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// One of the three scheduler phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// `System::start`.
    Start,
    /// `System::process`, once per tick.
    Process,
    /// `System::stop`.
    Stop,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Process => "process",
            Self::Stop => "stop",
        })
    }
}

/// One of the three manager lifecycle stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManagerStage {
    /// `Manager::init`.
    Init,
    /// `Manager::after_init`.
    AfterInit,
    /// `Manager::stop`.
    Stop,
}

impl fmt::Display for ManagerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::AfterInit => "after_init",
            Self::Stop => "stop",
        })
    }
}

/// Why a hook failed.
#[derive(Error, Debug)]
pub enum FailureCause {
    /// The hook returned an error.
    #[error("{0}")]
    Error(BoxError),

    /// The hook panicked. Holds the panic message when it was a string.
    #[error("panicked: {0}")]
    Panic(String),
}

/// A failed hook together with the type name of its owner.
#[derive(Error, Debug)]
#[error("{owner}: {cause}")]
pub struct HookFailure {
    /// Type name of the system or manager whose hook failed.
    pub owner: &'static str,
    /// What went wrong.
    pub cause: FailureCause,
}

/// Broad classification of [`EcsError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Attaching a deleted or already owned component, or mutating a
    /// deleted entity.
    Ownership,
    /// World configuration changed at the wrong point of its lifecycle.
    Lifecycle,
    /// A manager dependency is not registered.
    MissingDependency,
    /// A system or manager hook failed.
    Hook,
    /// Invalid configuration.
    Config,
}

/// Errors that can occur in the runtime.
#[derive(Error, Debug)]
pub enum EcsError {
    /// The component was removed from an entity and can never be attached again.
    #[error("component {component} is deleted and cannot be attached")]
    ComponentDeleted {
        /// Component type name.
        component: &'static str,
    },

    /// The component already belongs to an entity.
    #[error("component {component} is already owned by an entity")]
    ComponentOwned {
        /// Component type name.
        component: &'static str,
    },

    /// The entity was deleted; it accepts no further components.
    #[error("entity is deleted, component {component} was not attached")]
    EntityDeleted {
        /// Component type name.
        component: &'static str,
    },

    /// Managers can only be added before `World::init`.
    #[error("cannot add manager {manager}: world is already initialized")]
    ManagerAfterInit {
        /// Manager type name.
        manager: &'static str,
    },

    /// `World::init` was called twice.
    #[error("world is already initialized")]
    AlreadyInitialized,

    /// The operation requires an initialized world.
    #[error("world is not initialized")]
    NotInitialized,

    /// `World::stop` was called twice.
    #[error("managers are already stopped")]
    AlreadyStopped,

    /// A manager of this type is already registered.
    #[error("manager {0} is already registered")]
    DuplicateManager(&'static str),

    /// A system of this type is already registered.
    #[error("system {0} is already registered")]
    DuplicateSystem(&'static str),

    /// A declared manager dependency is not registered.
    #[error("manager {dependant} depends on unregistered manager {dependency}")]
    MissingDependency {
        /// The manager declaring the dependency.
        dependant: &'static str,
        /// The missing manager type.
        dependency: &'static str,
    },

    /// A manager hook failed while initializing.
    #[error("manager {manager} failed during {stage}: {cause}")]
    ManagerHook {
        /// Manager type name.
        manager: &'static str,
        /// Stage that failed.
        stage: ManagerStage,
        /// What went wrong.
        cause: FailureCause,
    },

    /// One or more managers failed to stop. Every manager was still stopped.
    #[error("{} manager(s) failed to stop", .failures.len())]
    ManagerStop {
        /// Every failed manager, in registration order.
        failures: Vec<HookFailure>,
    },

    /// One or more systems failed during a phase. The phase still waited
    /// for every other system.
    #[error("{phase} phase failed for {} system(s)", .failures.len())]
    Phase {
        /// Phase that failed.
        phase: Phase,
        /// Every failed system, in registration order.
        failures: Vec<HookFailure>,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EcsError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ComponentDeleted { .. }
            | Self::ComponentOwned { .. }
            | Self::EntityDeleted { .. } => ErrorKind::Ownership,
            Self::ManagerAfterInit { .. }
            | Self::AlreadyInitialized
            | Self::NotInitialized
            | Self::AlreadyStopped
            | Self::DuplicateManager(_)
            | Self::DuplicateSystem(_) => ErrorKind::Lifecycle,
            Self::MissingDependency { .. } => ErrorKind::MissingDependency,
            Self::ManagerHook { .. } | Self::ManagerStop { .. } | Self::Phase { .. } => {
                ErrorKind::Hook
            }
            Self::InvalidConfig(_) => ErrorKind::Config,
        }
    }
}
