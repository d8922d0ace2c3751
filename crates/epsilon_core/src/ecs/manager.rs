//! # Managers
//!
//! Managers are singleton services holding cross-cutting state (shared
//! configuration, loggers, registries) that systems look up by type.
//!
//! ## Lifecycle
//!
//! ```text
//! add_manager ──> Registered ──init──> Initialized ──after_init──> AfterInitialized ──stop──> Stopped
//! ```
//!
//! `init` runs on every manager before dependencies are validated, so it
//! must not assume any other manager exists yet. `after_init` only runs once
//! every declared dependency is known to be registered.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::any::AsAny;
use super::world::World;
use crate::error::HookResult;

/// A singleton service with its own lifecycle.
///
/// Hooks run sequentially on the thread driving the [`World`]. While a hook
/// runs, the manager is write-locked: looking up the same manager from
/// inside its own hook deadlocks.
///
/// # Example
///
/// ```rust
/// use epsilon_core::{HookResult, Manager, World};
///
/// #[derive(Default)]
/// struct MulManager {
///     velocity_mul: i64,
/// }
///
/// impl Manager for MulManager {
///     fn init(&mut self, _world: &World) -> HookResult {
///         self.velocity_mul = 2;
///         Ok(())
///     }
///
///     fn after_init(&mut self, _world: &World) -> HookResult {
///         self.velocity_mul = 3;
///         Ok(())
///     }
/// }
///
/// let mut world = World::with_workers(1).unwrap();
/// world.add_manager(MulManager::default()).unwrap();
/// world.init().unwrap();
/// assert_eq!(world.get_manager::<MulManager>().unwrap().velocity_mul, 3);
/// ```
pub trait Manager: AsAny + Send + Sync {
    /// First pass of `World::init`. Dependencies are not validated yet.
    ///
    /// # Errors
    ///
    /// Any error aborts `World::init`.
    fn init(&mut self, world: &World) -> HookResult;

    /// Second pass of `World::init`, once every dependency is registered.
    ///
    /// # Errors
    ///
    /// Any error aborts `World::init`.
    fn after_init(&mut self, _world: &World) -> HookResult {
        Ok(())
    }

    /// Called by `World::stop`.
    ///
    /// # Errors
    ///
    /// Errors are collected; the remaining managers are still stopped.
    fn stop(&mut self, _world: &World) -> HookResult {
        Ok(())
    }

    /// Managers that must be registered alongside this one.
    fn dependencies(&self) -> Vec<ManagerKey> {
        Vec::new()
    }

    /// Name used in errors and logs.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Type key naming a manager, used to declare dependencies.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerKey {
    type_id: TypeId,
    name: &'static str,
}

impl ManagerKey {
    /// Key of manager type `M`.
    #[must_use]
    pub fn of<M: Manager>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: type_name::<M>(),
        }
    }

    /// Type name of the manager.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// [`TypeId`] of the manager.
    #[inline]
    #[must_use]
    pub const fn type_id(self) -> TypeId {
        self.type_id
    }
}

impl fmt::Debug for ManagerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ManagerKey").field(&self.name).finish()
    }
}

/// Where a registered manager is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ManagerState {
    /// Added to the world, `init` not run yet.
    Registered,
    /// `init` succeeded.
    Initialized,
    /// `after_init` succeeded.
    AfterInitialized,
    /// `stop` was called.
    Stopped,
}

pub(crate) struct ManagerSlot {
    pub(crate) name: &'static str,
    pub(crate) instance: RwLock<Box<dyn Manager>>,
    pub(crate) state: ManagerState,
}

/// Managers keyed by concrete type, in registration order.
#[derive(Default)]
pub(crate) struct ManagerRegistry {
    slots: Vec<ManagerSlot>,
    index: HashMap<TypeId, usize>,
}

impl ManagerRegistry {
    /// Registers `manager`. Returns `false` if one of the same type exists.
    pub(crate) fn insert<M: Manager>(&mut self, manager: M) -> bool {
        let type_id = TypeId::of::<M>();
        if self.index.contains_key(&type_id) {
            return false;
        }
        self.index.insert(type_id, self.slots.len());
        self.slots.push(ManagerSlot {
            name: manager.name(),
            instance: RwLock::new(Box::new(manager)),
            state: ManagerState::Registered,
        });
        true
    }

    #[inline]
    pub(crate) fn contains(&self, type_id: TypeId) -> bool {
        self.index.contains_key(&type_id)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, index: usize) -> &ManagerSlot {
        &self.slots[index]
    }

    pub(crate) fn set_state(&mut self, index: usize, state: ManagerState) {
        self.slots[index].state = state;
    }

    pub(crate) fn state_of(&self, type_id: TypeId) -> Option<ManagerState> {
        self.index.get(&type_id).map(|&index| self.slots[index].state)
    }

    /// First declared dependency that is not registered, with its dependant.
    pub(crate) fn first_missing_dependency(&self) -> Option<(&'static str, ManagerKey)> {
        self.slots.iter().find_map(|slot| {
            slot.instance
                .read()
                .dependencies()
                .into_iter()
                .find(|key| !self.contains(key.type_id()))
                .map(|key| (slot.name, key))
        })
    }

    /// Recursive read: a thread already holding a read guard never queues
    /// behind a waiting writer.
    pub(crate) fn read<M: Manager>(&self) -> Option<MappedRwLockReadGuard<'_, M>> {
        let index = *self.index.get(&TypeId::of::<M>())?;
        RwLockReadGuard::try_map(self.slots[index].instance.read_recursive(), |manager| {
            (**manager).as_any().downcast_ref::<M>()
        })
        .ok()
    }

    pub(crate) fn write<M: Manager>(&self) -> Option<MappedRwLockWriteGuard<'_, M>> {
        let index = *self.index.get(&TypeId::of::<M>())?;
        RwLockWriteGuard::try_map(self.slots[index].instance.write(), |manager| {
            (**manager).as_any_mut().downcast_mut::<M>()
        })
        .ok()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|slot| slot.name)
    }
}
