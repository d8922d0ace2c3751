//! # Entity Component System
//!
//! ## Design Philosophy
//!
//! - Entities own their components exclusively; a component is attached to
//!   at most one entity, ever
//! - Deletion is soft: identities are never reused
//! - Managers and systems are singletons keyed by concrete type
//! - Shared state sits behind explicit locks, never behind aliasing

mod any;
mod component;
mod entity;
mod manager;
mod system;
mod world;

pub use any::AsAny;
pub use component::{Component, ComponentHandle};
pub use entity::{Entity, EntityId};
pub use manager::{Manager, ManagerKey, ManagerState};
pub use system::System;
pub use world::World;
