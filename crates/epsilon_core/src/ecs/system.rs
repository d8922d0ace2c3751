//! # Systems
//!
//! A system is a stateless behavior unit. The world calls its hooks once per
//! phase, concurrently with every other registered system.

use std::any::{type_name, TypeId};
use std::collections::HashSet;

use super::any::AsAny;
use super::world::World;
use crate::error::{HookResult, Phase};

/// A behavior unit driven by the world's phase scheduler.
///
/// Hooks take `&self`: a system keeps no state of its own between calls,
/// everything it reads or writes lives in entities and managers reached
/// through the `world` handle. Systems of the same phase run at the same
/// time and may touch the same entities; the runtime does not order them.
///
/// # Example
///
/// ```rust
/// use epsilon_core::{Component, HookResult, System, World};
///
/// struct Position { x: i64 }
/// impl Component for Position {}
///
/// struct Drift;
///
/// impl System for Drift {
///     fn process(&self, world: &World) -> HookResult {
///         for (_, entity) in world.get_entities_with_component::<Position>() {
///             if let Some(position) = entity.get_component::<Position>() {
///                 position.write().x += 1;
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait System: AsAny + Send + Sync {
    /// Called by `World::systems_start`.
    ///
    /// # Errors
    ///
    /// An error fails the phase once every other system has finished.
    fn start(&self, _world: &World) -> HookResult {
        Ok(())
    }

    /// Called by `World::systems_process`, once per tick.
    ///
    /// # Errors
    ///
    /// An error fails the phase once every other system has finished.
    fn process(&self, world: &World) -> HookResult;

    /// Called by `World::systems_stop`.
    ///
    /// # Errors
    ///
    /// An error fails the phase once every other system has finished.
    fn stop(&self, _world: &World) -> HookResult {
        Ok(())
    }

    /// Name used in errors and logs.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Runs the hook of `system` matching `phase`.
pub(crate) fn run_hook(system: &dyn System, phase: Phase, world: &World) -> HookResult {
    match phase {
        Phase::Start => system.start(world),
        Phase::Process => system.process(world),
        Phase::Stop => system.stop(world),
    }
}

/// Systems, unique by concrete type, in registration order.
#[derive(Default)]
pub(crate) struct SystemRegistry {
    systems: Vec<Box<dyn System>>,
    types: HashSet<TypeId>,
}

impl SystemRegistry {
    /// Registers `system`, handing it back if one of the same type exists.
    pub(crate) fn insert(&mut self, system: Box<dyn System>) -> Result<(), Box<dyn System>> {
        let type_id = (*system).concrete_type_id();
        if !self.types.insert(type_id) {
            return Err(system);
        }
        self.systems.push(system);
        Ok(())
    }

    pub(crate) fn get<S: System>(&self) -> Option<&S> {
        if !self.types.contains(&TypeId::of::<S>()) {
            return None;
        }
        self.systems
            .iter()
            .find_map(|system| (**system).as_any().downcast_ref::<S>())
    }

    #[inline]
    pub(crate) fn contains(&self, type_id: TypeId) -> bool {
        self.types.contains(&type_id)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.systems.len()
    }

    pub(crate) fn as_refs(&self) -> Vec<&dyn System> {
        self.systems.iter().map(|system| &**system).collect()
    }
}
