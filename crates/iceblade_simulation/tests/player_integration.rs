//! Player controller integration test
//!
//! Intents идут через `IntentEvent`, физику делает `HeadlessPlugin`
//! на сплошном полу (кроме тестов пула, где физика не нужна).

use bevy::prelude::*;
use iceblade_simulation::combat::{AttackSource, ContactSide};
use iceblade_simulation::headless::{replace_terrain, FlatTerrain};
use iceblade_simulation::*;

mod common;

const TICK_MS: u64 = 16;

fn create_app(config: SimulationConfig, with_physics: bool) -> App {
    let mut app = create_headless_app_with_config(7, SimulationConfig {
        clock: ClockMode::External,
        ..config
    });
    app.add_plugins(SimulationPlugin);
    common::record::<ProjectileFired>(&mut app);
    common::record::<AttackStarted>(&mut app);
    if with_physics {
        app.add_plugins(HeadlessPlugin::default());
        replace_terrain(app.world_mut(), FlatTerrain::solid(0.0));
    }
    app
}

fn spawn_player(app: &mut App) -> Entity {
    let config = app.world().resource::<SimulationConfig>().clone();
    let y = config.player.standing_extents[1];
    app.world_mut().spawn(player_bundle(&config, Vec2::new(0.0, y))).id()
}

fn tick(app: &mut App, entity: Entity, intents: &[Intent]) {
    for intent in intents {
        app.world_mut().send_event(IntentEvent::new(entity, *intent));
    }
    step(app, TICK_MS);
}

fn controller(app: &App, entity: Entity) -> &PlayerController {
    app.world().get::<PlayerController>(entity).unwrap()
}

fn kinematics(app: &App, entity: Entity) -> Kinematics {
    *app.world().get::<Kinematics>(entity).unwrap()
}

fn fired(app: &App) -> usize {
    common::recorded::<ProjectileFired>(app).len()
}

#[test]
fn test_move_sets_velocity_and_facing() {
    let mut app = create_app(SimulationConfig::default(), true);
    let player = spawn_player(&mut app);

    tick(&mut app, player, &[Intent::MoveLeft]);
    assert_eq!(kinematics(&app, player).velocity.x, -150.0);
    assert_eq!(*app.world().get::<Facing>(player).unwrap(), Facing::Left);

    tick(&mut app, player, &[]);
    assert_eq!(kinematics(&app, player).velocity.x, 0.0);
    // Facing не меняется без движения
    assert_eq!(*app.world().get::<Facing>(player).unwrap(), Facing::Left);

    for _ in 0..10 {
        tick(&mut app, player, &[Intent::MoveRight]);
    }
    assert!(kinematics(&app, player).position.x > 0.0);
    assert_eq!(*app.world().get::<Facing>(player).unwrap(), Facing::Right);
}

#[test]
fn test_jump_rising_edge_and_aerial_limit() {
    let mut app = create_app(SimulationConfig::default(), true);
    let player = spawn_player(&mut app);

    // Приземлились
    tick(&mut app, player, &[]);
    assert!(app.world().get::<GroundContact>(player).unwrap().on_ground);

    // Прыжок с земли, кнопка держится: второго прыжка нет
    tick(&mut app, player, &[Intent::JumpPressed]);
    assert!(kinematics(&app, player).velocity.y > 0.0);
    for _ in 0..5 {
        tick(&mut app, player, &[Intent::JumpPressed]);
    }
    assert_eq!(controller(&app, player).aerial_jumps, 0);

    // Отпустили и нажали в воздухе: aerial jump
    tick(&mut app, player, &[]);
    tick(&mut app, player, &[Intent::JumpPressed]);
    assert_eq!(controller(&app, player).aerial_jumps, 1);

    // Лимит исчерпан
    tick(&mut app, player, &[]);
    tick(&mut app, player, &[Intent::JumpPressed]);
    assert_eq!(controller(&app, player).aerial_jumps, 1);

    // Ждём приземления: счётчик сбрасывается
    for _ in 0..200 {
        tick(&mut app, player, &[]);
    }
    assert!(app.world().get::<GroundContact>(player).unwrap().on_ground);
    assert_eq!(controller(&app, player).aerial_jumps, 0);
    assert_eq!(kinematics(&app, player).position.y, 18.0);
}

#[test]
fn test_slide_blocks_locomotion_and_attacks() {
    let mut app = create_app(SimulationConfig::default(), true);
    let player = spawn_player(&mut app);
    tick(&mut app, player, &[]);

    tick(&mut app, player, &[Intent::CrouchStart]);
    assert!(controller(&app, player).is_sliding);
    assert_eq!(
        app.world().get::<Hurtbox>(player).unwrap().half_extents,
        Vec2::new(10.0, 9.0)
    );

    tick(&mut app, player, &[Intent::MoveLeft, Intent::AttackPrimary, Intent::AttackSecondary]);
    assert_eq!(*app.world().get::<Facing>(player).unwrap(), Facing::Right);
    assert_eq!(fired(&app), 0);
    assert!(common::recorded::<AttackStarted>(&app).is_empty());

    tick(&mut app, player, &[Intent::CrouchEnd]);
    assert!(!controller(&app, player).is_sliding);
    assert_eq!(
        app.world().get::<Hurtbox>(player).unwrap().half_extents,
        Vec2::new(10.0, 18.0)
    );
}

#[test]
fn test_crouch_end_honoured_during_stun() {
    let mut app = create_app(SimulationConfig::default(), true);
    let player = spawn_player(&mut app);
    tick(&mut app, player, &[]);
    tick(&mut app, player, &[Intent::CrouchStart]);

    app.world_mut().send_event(HitReport {
        defender: player,
        source: AttackSource::Hazard { damage: 5 },
        side: ContactSide::Right,
    });
    tick(&mut app, player, &[]);
    assert!(app.world().get::<CombatState>(player).unwrap().is_hit_stunned);

    // Во время stun: движение игнорируется, slide заканчивается
    let knockback = kinematics(&app, player).velocity.x;
    tick(&mut app, player, &[Intent::MoveRight, Intent::CrouchEnd]);
    assert!(!controller(&app, player).is_sliding);
    assert_eq!(kinematics(&app, player).velocity.x, knockback);
    assert!(knockback < 0.0);
}

#[test]
fn test_throw_gated_by_animation() {
    let mut app = create_app(SimulationConfig::default(), true);
    let player = spawn_player(&mut app);

    tick(&mut app, player, &[Intent::AttackPrimary]);
    tick(&mut app, player, &[Intent::AttackPrimary]);
    assert_eq!(fired(&app), 1, "throw animation still playing");

    // 300ms throw анимация
    for _ in 0..20 {
        tick(&mut app, player, &[]);
    }
    tick(&mut app, player, &[Intent::AttackPrimary]);
    assert_eq!(fired(&app), 2);
}

#[test]
fn test_exhausted_pool_is_unavailable() {
    let mut config = SimulationConfig::default();
    config.projectile.pool_capacity = 2;
    // Без headless физики анимации не играют: gate не мешает
    let mut app = create_app(config, false);
    let player = spawn_player(&mut app);

    for _ in 0..3 {
        tick(&mut app, player, &[Intent::AttackPrimary]);
    }

    assert_eq!(fired(&app), 2);
    let pool = app.world().get::<ProjectilePool>(player).unwrap();
    assert!(pool.is_exhausted());
    assert_eq!(pool.active_count(), 2);
}

#[test]
fn test_projectile_spawns_at_muzzle_along_facing() {
    let mut app = create_app(SimulationConfig::default(), false);
    let player = spawn_player(&mut app);

    tick(&mut app, player, &[Intent::MoveLeft, Intent::AttackPrimary]);

    let fired = common::recorded::<ProjectileFired>(&app);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].direction, Facing::Left);
    assert_eq!(fired[0].position, Vec2::new(-10.0, 18.0));
}
