//! # World
//!
//! The aggregate root: entity table, manager registry, system list and the
//! worker pool that drives the phases.
//!
//! ## Call Sequence
//!
//! ```text
//! new ──> add_manager* ──> init ──> add_system* / add_entity*
//!     ──> systems_start ──> systems_process* ──> systems_stop ──> stop
//! ```
//!
//! Entity operations take `&self` so systems may spawn and query entities
//! while a phase runs. Registration and lifecycle transitions take
//! `&mut self`.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock};

use super::component::Component;
use super::entity::{Entity, EntityId};
use super::manager::{Manager, ManagerRegistry, ManagerState};
use super::system::{run_hook, System, SystemRegistry};
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult, FailureCause, HookFailure, ManagerStage, Phase};
use crate::sched::{catch_hook, WorkerPool};

/// Container of entities, managers and systems.
///
/// # Example
///
/// ```rust
/// use epsilon_core::{Component, Entity, World};
///
/// struct Health(u32);
/// impl Component for Health {}
///
/// let mut world = World::with_workers(2).unwrap();
/// world.init().unwrap();
///
/// let id = world.add_entity(Entity::new().with(Health(100)).unwrap());
/// let found = world.get_entities_with_component::<Health>();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].0, id);
/// ```
pub struct World {
    config: WorldConfig,
    pool: WorkerPool,

    // ===== ENTITIES =====
    entities: RwLock<BTreeMap<EntityId, Entity>>,
    next_id: AtomicU64,

    // ===== MANAGERS & SYSTEMS =====
    managers: ManagerRegistry,
    systems: SystemRegistry,

    // ===== LIFECYCLE =====
    initialized: bool,
    stopped: bool,
    ticks: AtomicU64,
}

impl World {
    /// Creates a world with the default configuration: one worker per
    /// available CPU.
    #[must_use]
    pub fn new() -> Self {
        let config = WorldConfig::default();
        let pool = WorkerPool::new(config.workers)
            .unwrap_or(WorkerPool::with_size(NonZeroUsize::MIN));
        Self::from_parts(config, pool)
    }

    /// Creates a world whose phases run on at most `workers` threads.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if `workers` is zero.
    pub fn with_workers(workers: usize) -> EcsResult<Self> {
        Self::with_config(WorldConfig::with_workers(workers))
    }

    /// Creates a world from a loaded configuration.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the configuration does not validate.
    pub fn with_config(config: WorldConfig) -> EcsResult<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.workers)?;
        Ok(Self::from_parts(config, pool))
    }

    fn from_parts(config: WorldConfig, pool: WorkerPool) -> Self {
        tracing::debug!("World '{}' created with {} worker(s)", config.name, pool.size());
        Self {
            config,
            pool,
            entities: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            managers: ManagerRegistry::default(),
            systems: SystemRegistry::default(),
            initialized: false,
            stopped: false,
            ticks: AtomicU64::new(0),
        }
    }

    // ===== ENTITIES =====

    /// Registers `entity` under a fresh identity and returns it.
    ///
    /// Identities start at 1, grow strictly and are never reused. Adding
    /// the same entity twice registers it under two identities.
    pub fn add_entity(&self, entity: Entity) -> EntityId {
        let mut entities = self.entities.write();
        // Allocated under the table lock so identity order matches insertion order.
        let id = EntityId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        entities.insert(id, entity);
        id
    }

    /// The entity registered under `id`, deleted or not.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<Entity> {
        self.entities.read().get(&id).cloned()
    }

    /// Every entity currently holding a `C` component, in identity order.
    #[must_use]
    pub fn get_entities_with_component<C: Component>(&self) -> Vec<(EntityId, Entity)> {
        self.entities
            .read()
            .iter()
            .filter(|(_, entity)| entity.has_component::<C>())
            .map(|(id, entity)| (*id, entity.clone()))
            .collect()
    }

    /// Snapshot of every registered entity, in identity order.
    #[must_use]
    pub fn entities(&self) -> Vec<(EntityId, Entity)> {
        self.entities
            .read()
            .iter()
            .map(|(id, entity)| (*id, entity.clone()))
            .collect()
    }

    /// Number of registered entities, soft-deleted ones included.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.read().len()
    }

    // ===== MANAGERS =====

    /// Registers a manager.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ManagerAfterInit`] once the world is initialized
    /// - [`EcsError::DuplicateManager`] if a manager of type `M` exists
    pub fn add_manager<M: Manager>(&mut self, manager: M) -> EcsResult<()> {
        let name = manager.name();
        if self.initialized {
            return Err(EcsError::ManagerAfterInit { manager: name });
        }
        if !self.managers.insert(manager) {
            return Err(EcsError::DuplicateManager(name));
        }
        tracing::debug!("Manager registered: {}", name);
        Ok(())
    }

    /// Read access to the manager of type `M`.
    ///
    /// Blocks while the manager is write-locked, which includes the
    /// duration of its own lifecycle hooks. The read lock is recursive: a
    /// system holding a guard may look the manager up again while another
    /// system waits in [`World::get_manager_mut`].
    #[must_use]
    pub fn get_manager<M: Manager>(&self) -> Option<MappedRwLockReadGuard<'_, M>> {
        self.managers.read::<M>()
    }

    /// Write access to the manager of type `M`.
    #[must_use]
    pub fn get_manager_mut<M: Manager>(&self) -> Option<MappedRwLockWriteGuard<'_, M>> {
        self.managers.write::<M>()
    }

    /// Returns `true` if a manager of type `M` is registered.
    #[must_use]
    pub fn has_manager<M: Manager>(&self) -> bool {
        self.managers.contains(TypeId::of::<M>())
    }

    /// Lifecycle state of the manager of type `M`.
    #[must_use]
    pub fn manager_state<M: Manager>(&self) -> Option<ManagerState> {
        self.managers.state_of(TypeId::of::<M>())
    }

    /// Number of registered managers.
    #[must_use]
    pub fn manager_count(&self) -> usize {
        self.managers.len()
    }

    /// Initializes every manager.
    ///
    /// Runs `init` on every manager in registration order, validates the
    /// declared dependencies, then runs `after_init` on every manager. A
    /// failed call leaves the world uninitialized; fixing the cause and
    /// calling `init` again re-runs the whole sequence.
    ///
    /// # Errors
    ///
    /// - [`EcsError::AlreadyInitialized`] on a second successful call
    /// - [`EcsError::ManagerHook`] if a hook fails, naming manager and stage
    /// - [`EcsError::MissingDependency`] if a dependency is not registered;
    ///   no `after_init` hook runs in that case
    pub fn init(&mut self) -> EcsResult<()> {
        if self.initialized {
            return Err(EcsError::AlreadyInitialized);
        }

        for index in 0..self.managers.len() {
            self.run_manager_stage(index, ManagerStage::Init)?;
            self.managers.set_state(index, ManagerState::Initialized);
        }

        if let Some((dependant, dependency)) = self.managers.first_missing_dependency() {
            tracing::warn!(
                "Manager {} depends on unregistered manager {}",
                dependant,
                dependency.name()
            );
            return Err(EcsError::MissingDependency {
                dependant,
                dependency: dependency.name(),
            });
        }

        for index in 0..self.managers.len() {
            self.run_manager_stage(index, ManagerStage::AfterInit)?;
            self.managers.set_state(index, ManagerState::AfterInitialized);
        }

        self.initialized = true;
        tracing::info!(
            "World '{}' initialized with {} manager(s)",
            self.config.name,
            self.managers.len()
        );
        Ok(())
    }

    /// Stops every manager in registration order.
    ///
    /// A failing manager does not prevent the others from being stopped.
    ///
    /// # Errors
    ///
    /// - [`EcsError::NotInitialized`] before a successful [`World::init`]
    /// - [`EcsError::AlreadyStopped`] on a second call
    /// - [`EcsError::ManagerStop`] listing every manager whose hook failed
    pub fn stop(&mut self) -> EcsResult<()> {
        if !self.initialized {
            return Err(EcsError::NotInitialized);
        }
        if self.stopped {
            return Err(EcsError::AlreadyStopped);
        }

        let mut failures = Vec::new();
        for index in 0..self.managers.len() {
            let name = self.managers.slot(index).name;
            let outcome = self.call_manager(index, ManagerStage::Stop);
            self.managers.set_state(index, ManagerState::Stopped);
            if let Err(cause) = outcome {
                tracing::warn!("Manager {} failed to stop: {}", name, cause);
                failures.push(HookFailure { owner: name, cause });
            }
        }
        self.stopped = true;
        tracing::info!("World '{}' stopped {} manager(s)", self.config.name, self.managers.len());

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EcsError::ManagerStop { failures })
        }
    }

    fn run_manager_stage(&self, index: usize, stage: ManagerStage) -> EcsResult<()> {
        self.call_manager(index, stage).map_err(|cause| {
            let manager = self.managers.slot(index).name;
            tracing::warn!("Manager {} failed during {}: {}", manager, stage, cause);
            EcsError::ManagerHook {
                manager,
                stage,
                cause,
            }
        })
    }

    fn call_manager(&self, index: usize, stage: ManagerStage) -> Result<(), FailureCause> {
        let slot = self.managers.slot(index);
        catch_hook(|| {
            let mut manager = slot.instance.write();
            match stage {
                ManagerStage::Init => manager.init(self),
                ManagerStage::AfterInit => manager.after_init(self),
                ManagerStage::Stop => manager.stop(self),
            }
        })
    }

    // ===== SYSTEMS =====

    /// Registers a system.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateSystem`] if a system of the same type exists.
    pub fn add_system<S: System>(&mut self, system: S) -> EcsResult<()> {
        self.register_system(Box::new(system))
    }

    /// Registers several systems in order, stopping at the first duplicate.
    /// Systems before the duplicate stay registered.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateSystem`] naming the first duplicate.
    pub fn add_systems<I>(&mut self, systems: I) -> EcsResult<()>
    where
        I: IntoIterator<Item = Box<dyn System>>,
    {
        systems
            .into_iter()
            .try_for_each(|system| self.register_system(system))
    }

    fn register_system(&mut self, system: Box<dyn System>) -> EcsResult<()> {
        let name = system.name();
        match self.systems.insert(system) {
            Ok(()) => {
                tracing::debug!("System registered: {}", name);
                Ok(())
            }
            Err(rejected) => Err(EcsError::DuplicateSystem(rejected.name())),
        }
    }

    /// The registered system of type `S`.
    #[must_use]
    pub fn get_system<S: System>(&self) -> Option<&S> {
        self.systems.get::<S>()
    }

    /// Returns `true` if a system of type `S` is registered.
    #[must_use]
    pub fn has_system<S: System>(&self) -> bool {
        self.systems.contains(TypeId::of::<S>())
    }

    /// Number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Runs `start` on every system and waits for all of them.
    ///
    /// # Errors
    ///
    /// [`EcsError::Phase`] listing every system that failed or panicked.
    pub fn systems_start(&self) -> EcsResult<()> {
        self.run_phase(Phase::Start)
    }

    /// Runs `process` on every system, waits for all of them and advances
    /// the tick counter.
    ///
    /// # Errors
    ///
    /// [`EcsError::Phase`] listing every system that failed or panicked.
    pub fn systems_process(&self) -> EcsResult<()> {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.run_phase(Phase::Process)
    }

    /// Runs `stop` on every system and waits for all of them.
    ///
    /// # Errors
    ///
    /// [`EcsError::Phase`] listing every system that failed or panicked.
    pub fn systems_stop(&self) -> EcsResult<()> {
        self.run_phase(Phase::Stop)
    }

    fn run_phase(&self, phase: Phase) -> EcsResult<()> {
        let systems = self.systems.as_refs();
        tracing::trace!(
            "Running {} phase at tick {} for {} system(s)",
            phase,
            self.tick(),
            systems.len()
        );

        let outcomes = self.pool.run(&systems, |system| run_hook(*system, phase, self));
        let failures: Vec<HookFailure> = systems
            .iter()
            .zip(outcomes)
            .filter_map(|(system, outcome)| {
                outcome.err().map(|cause| HookFailure {
                    owner: system.name(),
                    cause,
                })
            })
            .collect();

        if failures.is_empty() {
            return Ok(());
        }
        for failure in &failures {
            tracing::warn!("System failed during {} phase: {}", phase, failure);
        }
        Err(EcsError::Phase { phase, failures })
    }

    // ===== STATE =====

    /// Number of completed or running `systems_process` calls.
    #[inline]
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Returns `true` after a successful [`World::init`].
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns `true` after [`World::stop`].
    #[inline]
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Worker pool size.
    #[inline]
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Name from the configuration.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration the world was built from.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("name", &self.config.name)
            .field("workers", &self.pool.size())
            .field("entities", &self.entity_count())
            .field("managers", &self.managers.names().collect::<Vec<_>>())
            .field("systems", &self.systems.len())
            .field("initialized", &self.initialized)
            .field("stopped", &self.stopped)
            .field("tick", &self.tick())
            .finish()
    }
}
