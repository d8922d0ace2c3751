//! Integration tests for the engine facade: a world built from
//! `EngineConfig` with its `LoggingManager` driven through a full run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use epsilon_engine::{
    Component, EngineConfig, Entity, HookResult, LoggingManager, Manager, ManagerKey, System,
    World, MANAGER_LOGGER,
};

struct Health(u32);
impl Component for Health {}

/// Manager requiring logging, grabbing its own logger after init.
#[derive(Default)]
struct CombatManager {
    damage: u32,
}

impl Manager for CombatManager {
    fn init(&mut self, _world: &World) -> HookResult {
        self.damage = 5;
        Ok(())
    }

    fn after_init(&mut self, world: &World) -> HookResult {
        let mut logging = world
            .get_manager_mut::<LoggingManager>()
            .ok_or("logging manager missing")?;
        logging.new_logger("combat").info("combat ready");
        Ok(())
    }

    fn dependencies(&self) -> Vec<ManagerKey> {
        vec![ManagerKey::of::<LoggingManager>()]
    }
}

struct Combat {
    runs: Arc<AtomicUsize>,
}

impl System for Combat {
    fn process(&self, world: &World) -> HookResult {
        let damage = world.get_manager::<CombatManager>().ok_or("combat missing")?.damage;
        for (id, entity) in world.get_entities_with_component::<Health>() {
            let Some(health) = entity.get_component::<Health>() else {
                continue;
            };
            let mut health = health.write();
            health.0 = health.0.saturating_sub(damage);
            if health.0 == 0 {
                if let Some(logger) = world
                    .get_manager::<LoggingManager>()
                    .and_then(|logging| logging.logger("combat"))
                {
                    logger.info(format_args!("entity {id} died"));
                }
            }
        }
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn engine_world() -> World {
    let config = EngineConfig::from_toml_str("[world]\nname = \"arena\"\nworkers = 2").unwrap();
    config.build_world().unwrap()
}

#[test]
fn test_logging_manager_lifecycle() {
    let mut world = engine_world();
    world.init().unwrap();

    let logging = world.get_manager::<LoggingManager>().unwrap();
    assert!(logging.logger(MANAGER_LOGGER).is_some());
    assert!(logging.logger("missing").is_none());
    drop(logging);

    world.stop().unwrap();
}

#[test]
fn test_dependant_manager_gets_logger() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut world = engine_world();
    world.add_manager(CombatManager::default()).unwrap();
    world.init().unwrap();
    world.add_system(Combat { runs: Arc::clone(&runs) }).unwrap();

    let knight = world.add_entity(Entity::new().with(Health(12)).unwrap());

    world.systems_start().unwrap();
    for _ in 0..3 {
        world.systems_process().unwrap();
    }
    world.systems_stop().unwrap();

    let health = world
        .get_entity(knight)
        .and_then(|entity| entity.get_component::<Health>())
        .unwrap();
    assert_eq!(health.read().0, 0);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert!(world
        .get_manager::<LoggingManager>()
        .unwrap()
        .logger("combat")
        .is_some());
    assert_eq!(world.name(), "arena");

    world.stop().unwrap();
}

#[test]
fn test_missing_logging_dependency() {
    let mut world = World::with_workers(1).unwrap();
    world.add_manager(CombatManager::default()).unwrap();

    let err = world.init().unwrap_err();
    assert!(err.to_string().contains("LoggingManager"));
}

#[test]
fn test_unwritable_log_file_fails_init() {
    let config = EngineConfig::from_toml_str(
        "[logging]\nfile = \"/nonexistent-epsilon-dir/sub/engine.log\"",
    )
    .unwrap();
    let mut world = config.build_world().unwrap();

    let err = world.init().unwrap_err();
    assert!(err.to_string().contains("cannot create log file"));
    assert!(!world.is_initialized());
}
