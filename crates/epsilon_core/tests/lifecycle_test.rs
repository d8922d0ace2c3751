//! # World Lifecycle Tests
//!
//! Drives complete worlds through init, the three phases and stop:
//!
//! 1. **Movement**: velocity scaled by a manager-owned multiplier
//! 2. **Manager protocol**: hook order, dependency validation, lifecycle errors
//!
//! Run with: cargo test --package epsilon_core --test lifecycle_test

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use epsilon_core::{
    Component, EcsError, Entity, ErrorKind, HookResult, Manager, ManagerKey, ManagerStage,
    ManagerState, System, World,
};

// ============================================================================
// MOVEMENT SCENARIO
// ============================================================================

struct Position {
    x: i64,
    y: i64,
}
impl Component for Position {}

struct Velocity {
    x_speed: i64,
    y_speed: i64,
}
impl Component for Velocity {}

#[derive(Default)]
struct MulManager {
    velocity_mul: i64,
}

impl Manager for MulManager {
    fn init(&mut self, _world: &World) -> HookResult {
        self.velocity_mul = 2;
        Ok(())
    }

    fn after_init(&mut self, _world: &World) -> HookResult {
        self.velocity_mul = 3;
        Ok(())
    }
}

struct VelocitySystem;

impl System for VelocitySystem {
    fn process(&self, world: &World) -> HookResult {
        let mul = world
            .get_manager::<MulManager>()
            .ok_or("MulManager is not registered")?
            .velocity_mul;

        for (_, entity) in world.get_entities_with_component::<Velocity>() {
            let (Some(position), Some(velocity)) = (
                entity.get_component::<Position>(),
                entity.get_component::<Velocity>(),
            ) else {
                continue;
            };
            let velocity = velocity.read();
            let mut position = position.write();
            position.x += velocity.x_speed * mul;
            position.y += velocity.y_speed * mul;
        }
        Ok(())
    }
}

#[test]
fn test_velocity_scenario() {
    let mut world = World::with_workers(4).unwrap();
    world.add_manager(MulManager::default()).unwrap();
    world.init().unwrap();
    world.add_system(VelocitySystem).unwrap();

    let entity = Entity::new()
        .with(Position { x: 0, y: 0 })
        .unwrap()
        .with(Velocity { x_speed: 1, y_speed: 0 })
        .unwrap();
    let id = world.add_entity(entity);

    world.systems_start().unwrap();
    for _ in 0..10 {
        world.systems_process().unwrap();
    }
    world.systems_stop().unwrap();
    world.stop().unwrap();

    let entity = world.get_entity(id).unwrap();
    let position = entity.get_component::<Position>().unwrap();
    let position = position.read();
    assert_eq!(position.x, 30);
    assert_eq!(position.y, 0);
    assert_eq!(world.tick(), 10);
}

#[test]
fn test_entity_without_velocity_is_untouched() {
    let mut world = World::with_workers(2).unwrap();
    world.add_manager(MulManager::default()).unwrap();
    world.init().unwrap();
    world.add_system(VelocitySystem).unwrap();

    let still = world.add_entity(Entity::new().with(Position { x: 5, y: 5 }).unwrap());
    world.systems_process().unwrap();

    let position = world
        .get_entity(still)
        .and_then(|entity| entity.get_component::<Position>())
        .unwrap();
    let position = position.read();
    assert_eq!((position.x, position.y), (5, 5));
}

#[test]
fn test_entity_ids_strictly_increase() {
    let world = World::with_workers(1).unwrap();
    let ids: Vec<_> = (0..100).map(|_| world.add_entity(Entity::new())).collect();

    assert_eq!(ids[0].raw(), 1);
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    world.get_entity(ids[10]).unwrap().delete();
    let next = world.add_entity(Entity::new());
    assert!(next > ids[99]);
}

// ============================================================================
// MANAGER PROTOCOL
// ============================================================================

/// Shared record of every hook call, in order.
#[derive(Clone, Default)]
struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    fn record(&self, owner: &str, hook: &str) {
        self.calls.lock().push(format!("{owner}.{hook}"));
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

struct Storage {
    log: CallLog,
}

impl Manager for Storage {
    fn init(&mut self, _world: &World) -> HookResult {
        self.log.record("storage", "init");
        Ok(())
    }

    fn after_init(&mut self, _world: &World) -> HookResult {
        self.log.record("storage", "after_init");
        Ok(())
    }

    fn stop(&mut self, _world: &World) -> HookResult {
        self.log.record("storage", "stop");
        Ok(())
    }
}

struct Network {
    log: CallLog,
}

impl Manager for Network {
    fn init(&mut self, _world: &World) -> HookResult {
        self.log.record("network", "init");
        Ok(())
    }

    fn after_init(&mut self, world: &World) -> HookResult {
        // Dependencies are guaranteed to be registered here.
        let storage = world.get_manager::<Storage>().ok_or("storage missing")?;
        storage.log.record("network", "after_init");
        Ok(())
    }

    fn stop(&mut self, _world: &World) -> HookResult {
        self.log.record("network", "stop");
        Ok(())
    }

    fn dependencies(&self) -> Vec<ManagerKey> {
        vec![ManagerKey::of::<Storage>()]
    }
}

#[test]
fn test_init_runs_every_init_before_after_init() {
    let log = CallLog::default();
    let mut world = World::with_workers(1).unwrap();
    world.add_manager(Network { log: log.clone() }).unwrap();
    world.add_manager(Storage { log: log.clone() }).unwrap();

    world.init().unwrap();
    assert!(world.is_initialized());
    assert_eq!(
        log.calls(),
        vec![
            "network.init",
            "storage.init",
            "network.after_init",
            "storage.after_init",
        ]
    );
    assert_eq!(world.manager_state::<Network>(), Some(ManagerState::AfterInitialized));

    world.stop().unwrap();
    assert_eq!(log.calls()[4..].to_vec(), vec!["network.stop", "storage.stop"]);
    assert_eq!(world.manager_state::<Storage>(), Some(ManagerState::Stopped));
}

#[test]
fn test_missing_dependency_skips_after_init() {
    let log = CallLog::default();
    let mut world = World::with_workers(1).unwrap();
    world.add_manager(Network { log: log.clone() }).unwrap();

    let err = world.init().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingDependency);
    match err {
        EcsError::MissingDependency { dependant, dependency } => {
            assert!(dependant.ends_with("Network"));
            assert!(dependency.ends_with("Storage"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(log.calls(), vec!["network.init"]);
    assert!(!world.is_initialized());
}

#[test]
fn test_add_manager_after_init_fails() {
    let mut world = World::with_workers(1).unwrap();
    world.init().unwrap();

    let err = world.add_manager(MulManager::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lifecycle);
    assert!(matches!(err, EcsError::ManagerAfterInit { .. }));
    assert!(!world.has_manager::<MulManager>());
}

struct Counting {
    inits: Arc<AtomicUsize>,
}

impl Manager for Counting {
    fn init(&mut self, _world: &World) -> HookResult {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Exploding;

impl Manager for Exploding {
    fn init(&mut self, _world: &World) -> HookResult {
        Ok(())
    }

    fn after_init(&mut self, _world: &World) -> HookResult {
        panic!("after_init exploded");
    }
}

#[test]
fn test_panicking_hook_aborts_init() {
    let inits = Arc::new(AtomicUsize::new(0));
    let mut world = World::with_workers(1).unwrap();
    world.add_manager(Exploding).unwrap();
    world.add_manager(Counting { inits: Arc::clone(&inits) }).unwrap();

    match world.init() {
        Err(EcsError::ManagerHook { manager, stage, .. }) => {
            assert!(manager.ends_with("Exploding"));
            assert_eq!(stage, ManagerStage::AfterInit);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(inits.load(Ordering::SeqCst), 1);
    assert_eq!(world.manager_state::<Counting>(), Some(ManagerState::Initialized));
    assert!(!world.is_initialized());
}

#[test]
fn test_manager_visible_to_systems() {
    struct Reader {
        seen: Arc<AtomicUsize>,
    }

    impl System for Reader {
        fn process(&self, world: &World) -> HookResult {
            let mul = world.get_manager::<MulManager>().ok_or("missing")?.velocity_mul;
            self.seen.store(usize::try_from(mul)?, Ordering::SeqCst);
            Ok(())
        }
    }

    let seen = Arc::new(AtomicUsize::new(0));
    let mut world = World::with_workers(2).unwrap();
    world.add_manager(MulManager::default()).unwrap();
    world.init().unwrap();
    world.add_system(Reader { seen: Arc::clone(&seen) }).unwrap();

    world.get_manager_mut::<MulManager>().unwrap().velocity_mul = 7;
    world.systems_process().unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 7);
}
