//! # Epsilon Core
//!
//! Entity-component-system runtime for the Epsilon engine.
//!
//! ## Design Principles
//!
//! 1. **Exclusive ownership** - A component belongs to at most one entity, ever
//! 2. **Soft deletion** - Deleted entities and components are flagged, never recycled
//! 3. **Typed singletons** - One manager and one system per concrete type
//! 4. **Phase barrier** - Every system finishes a phase before the next one starts
//!
//! ## Thread Safety
//!
//! Systems of one phase run concurrently on a bounded worker pool and share
//! a `&World`. Component values, managers and the entity table sit behind
//! `parking_lot` read-write locks; the runtime orders nothing beyond that.
//!
//! ## Example
//!
//! ```rust
//! use epsilon_core::{Component, Entity, HookResult, System, World};
//!
//! struct Position { x: i64 }
//! impl Component for Position {}
//!
//! struct Velocity { dx: i64 }
//! impl Component for Velocity {}
//!
//! struct Movement;
//!
//! impl System for Movement {
//!     fn process(&self, world: &World) -> HookResult {
//!         for (_, entity) in world.get_entities_with_component::<Velocity>() {
//!             let (Some(position), Some(velocity)) = (
//!                 entity.get_component::<Position>(),
//!                 entity.get_component::<Velocity>(),
//!             ) else {
//!                 continue;
//!             };
//!             position.write().x += velocity.read().dx;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut world = World::with_workers(2)?;
//! world.init()?;
//! world.add_system(Movement)?;
//!
//! let ship = Entity::new().with(Position { x: 0 })?.with(Velocity { dx: 2 })?;
//! world.add_entity(ship.clone());
//!
//! world.systems_start()?;
//! for _ in 0..5 {
//!     world.systems_process()?;
//! }
//! world.systems_stop()?;
//! world.stop()?;
//!
//! assert_eq!(ship.get_component::<Position>().unwrap().read().x, 10);
//! # Ok::<(), epsilon_core::EcsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod sched;

pub use config::WorldConfig;
pub use ecs::{
    AsAny, Component, ComponentHandle, Entity, EntityId, Manager, ManagerKey, ManagerState, System,
    World,
};
pub use error::{
    BoxError, EcsError, EcsResult, ErrorKind, FailureCause, HookFailure, HookResult, ManagerStage,
    Phase,
};
pub use sched::WorkerPool;
