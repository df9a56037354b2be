//! Patrol AI integration test
//!
//! Враги на headless уровне: ledge detection, max distance, hysteresis.

use bevy::prelude::*;
use iceblade_simulation::combat::{AttackSource, ContactSide};
use iceblade_simulation::headless::{replace_terrain, FlatTerrain};
use iceblade_simulation::*;

mod common;

const TICK_MS: u64 = 16;

fn create_patrol_app(config: SimulationConfig, terrain: FlatTerrain) -> App {
    let mut app = create_headless_app_with_config(11, SimulationConfig {
        clock: ClockMode::External,
        ..config
    });
    app.add_plugins((SimulationPlugin, HeadlessPlugin::default()));
    common::record::<TurnEvent>(&mut app);
    common::record::<EntityDeactivated>(&mut app);
    replace_terrain(app.world_mut(), terrain);
    app
}

fn spawn_enemy(app: &mut App, x: f32, facing: Facing) -> Entity {
    let config = app.world().resource::<SimulationConfig>().clone();
    let y = config.enemy.half_extents[1];
    app.world_mut().spawn(enemy_bundle(&config, Vec2::new(x, y), facing)).id()
}

fn turns(app: &App) -> Vec<TurnEvent> {
    common::recorded(app)
}

/// Scenario: max distance 1000, сплошной пол: ровно один разворот
#[test]
fn test_max_distance_turns_exactly_once() {
    let mut config = SimulationConfig::default();
    config.patrol.max_distance = 1000.0;
    let mut app = create_patrol_app(config, FlatTerrain::solid(0.0));
    let enemy = spawn_enemy(&mut app, 0.0, Facing::Right);

    for _ in 0..1200 {
        step(&mut app, TICK_MS);
    }

    let turns = turns(&app);
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].enemy, enemy);
    assert_eq!(turns[0].new_direction, Facing::Left);

    let patrol = app.world().get::<PatrolState>(enemy).unwrap();
    assert_eq!(patrol.speed, -100.0);
    assert_eq!(patrol.traveled, 200.0);
    assert_eq!(*app.world().get::<Facing>(enemy).unwrap(), Facing::Left);
    assert_eq!(app.world().get::<Kinematics>(enemy).unwrap().velocity.x, -100.0);
}

/// Test: враг разворачивается у края и не падает с платформы
#[test]
fn test_ledge_turns_keep_enemy_on_platform() {
    let mut config = SimulationConfig::default();
    config.patrol.max_distance = 10_000.0;
    let terrain = FlatTerrain::from_segments(0.0, vec![(0.0, 400.0)]);
    let mut app = create_patrol_app(config, terrain);
    let enemy = spawn_enemy(&mut app, 100.0, Facing::Right);

    for tick in 0..1000 {
        step(&mut app, TICK_MS);
        let x = app.world().get::<Kinematics>(enemy).unwrap().position.x;
        assert!((0.0..=400.0).contains(&x), "Tick {}: enemy walked off at x={}", tick, x);
        assert!(app.world().get::<GroundContact>(enemy).unwrap().on_ground);
    }

    let turns = turns(&app);
    assert!(turns.len() >= 3);
    // Hysteresis: развороты не чаще 700ms (44 тика по 16ms)
    assert!(turns.windows(2).all(|pair| pair[0].new_direction != pair[1].new_direction));
}

/// Test: при max distance меньше шага развороты всё равно не чаще интервала
#[test]
fn test_hysteresis_limits_turn_rate() {
    let mut config = SimulationConfig::default();
    config.patrol.max_distance = 0.5;
    let mut app = create_patrol_app(config, FlatTerrain::solid(0.0));
    let enemy = spawn_enemy(&mut app, 0.0, Facing::Right);

    let mut turn_ticks = Vec::new();
    let mut seen = 0;
    for tick in 0..500u64 {
        step(&mut app, TICK_MS);
        let count = turns(&app).len();
        if count > seen {
            assert_eq!(count, seen + 1, "two turns in one tick");
            turn_ticks.push(tick);
            seen = count;
        }
    }

    assert!(turn_ticks.len() > 5);
    for pair in turn_ticks.windows(2) {
        assert!((pair[1] - pair[0]) * TICK_MS >= 700, "turns too close: {:?}", pair);
    }
    assert!(app.world().get::<PatrolState>(enemy).is_some());
}

/// Test: в воздухе патруль стоит (дистанция не копится)
#[test]
fn test_off_ground_patrol_is_noop() {
    let terrain = FlatTerrain::from_segments(0.0, vec![(500.0, 1000.0)]);
    let mut app = create_patrol_app(SimulationConfig::default(), terrain);
    let enemy = spawn_enemy(&mut app, 0.0, Facing::Right);

    for _ in 0..30 {
        step(&mut app, TICK_MS);
    }

    let patrol = app.world().get::<PatrolState>(enemy).unwrap();
    assert_eq!(patrol.traveled, 0.0);
    assert!(turns(&app).is_empty());
    assert!(app.world().get::<Kinematics>(enemy).unwrap().position.y < 0.0);
}

/// Test: stunned враг не патрулирует, knockback сохраняется
#[test]
fn test_stunned_enemy_keeps_knockback() {
    let mut config = SimulationConfig::default();
    config.patrol.max_distance = 1000.0;
    let mut app = create_patrol_app(config, FlatTerrain::solid(0.0));
    let enemy = spawn_enemy(&mut app, 0.0, Facing::Right);

    step(&mut app, TICK_MS);
    step(&mut app, TICK_MS);
    let traveled = app.world().get::<PatrolState>(enemy).unwrap().traveled;

    app.world_mut().send_event(HitReport {
        defender: enemy,
        source: AttackSource::Hazard { damage: 5 },
        side: ContactSide::Right,
    });
    step(&mut app, TICK_MS);

    for _ in 0..20 {
        step(&mut app, TICK_MS);
        let kinematics = app.world().get::<Kinematics>(enemy).unwrap();
        assert_eq!(kinematics.velocity.x, -125.0);
    }
    assert_eq!(app.world().get::<PatrolState>(enemy).unwrap().traveled, traveled);
}

/// Test: defeated враг проваливается сквозь пол и выходит за bounds
#[test]
fn test_defeated_enemy_falls_out_of_bounds() {
    let mut config = SimulationConfig::default();
    config.world.bounds = Some(config::BoundsTuning {
        min: [-1000.0, -300.0],
        max: [1000.0, 1000.0],
    });
    let mut app = create_patrol_app(config, FlatTerrain::solid(0.0));
    let enemy = spawn_enemy(&mut app, 0.0, Facing::Right);

    step(&mut app, TICK_MS);
    app.world_mut().send_event(HitReport {
        defender: enemy,
        source: AttackSource::Hazard { damage: 1000 },
        side: ContactSide::Left,
    });

    for _ in 0..200 {
        step(&mut app, TICK_MS);
    }

    let world = app.world();
    assert!(world.get::<Defeated>(enemy).is_some());
    assert!(world.get::<Deactivated>(enemy).is_some());
    let deactivated = common::recorded::<EntityDeactivated>(&app);
    assert_eq!(deactivated.len(), 1);
}
