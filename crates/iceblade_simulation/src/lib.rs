//! ICEBLADE Simulation Core
//!
//! ECS-симуляция 2D платформера на Bevy 0.16 (gameplay layer)
//!
//! HYBRID ARCHITECTURE:
//! - ECS = gameplay rules (combat, hit-stun, patrol AI, player control)
//! - Host = engine layer (physics integration, collisions с уровнем, анимации, рендер)
//!
//! Host общается с ядром через компоненты (`GroundContact`, `AnimationState`,
//! `Kinematics.position`), `SpatialQueries` и события (`IntentEvent` на вход,
//! `DamageEvent` / `ProjectileFired` / `TurnEvent` / ... на выход).

use bevy::ecs::event::event_update_system;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod clock;
pub mod combat;
pub mod components;
pub mod config;
pub mod headless;
pub mod lifecycle;
pub mod logger;
pub mod outcome;
pub mod player;
pub mod spatial;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, PatrolState, TurnEvent};
pub use clock::{SimulationClock, Timestamp};
pub use combat::{
    CombatPlugin, CombatState, DamageEvent, EntityDefeated, HitReport, MeleeWeapon, ProjectileExpired,
    ProjectileFired, ProjectilePool, Score, ScoreChanged,
};
pub use components::*;
pub use config::{ClockMode, ConfigError, SimulationConfig};
pub use headless::HeadlessPlugin;
pub use lifecycle::{EntityDeactivated, PlayableBounds};
pub use logger::init_logger;
pub use outcome::Rejection;
pub use player::{AttackStarted, PlayerController, PlayerPlugin};
pub use spatial::{SpatialQueries, SpatialQuery};

/// Фазы одного simulation тика (FixedUpdate), строго по порядку
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Синхронизация `SimulationClock`
    Clock,
    /// Intents → velocity / атаки
    Intents,
    /// Интеграция (host) + движение снарядов и range expiry
    Physics,
    /// Hit-stun expiry, hit detection
    Collision,
    /// Урон, патруль, bounds
    Resolution,
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// `SimulationConfig` нужно вставить до `add_plugins`, иначе берутся defaults.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationConfig>()
            .init_resource::<SimulationClock>()
            .init_resource::<SpatialQueries>()
            .add_event::<EntityDeactivated>();

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        let bounds = PlayableBounds::from_tuning(&app.world().resource::<SimulationConfig>().world);
        if let Some(bounds) = bounds {
            app.insert_resource(bounds);
        }

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Clock,
                SimulationSet::Intents,
                SimulationSet::Physics,
                SimulationSet::Collision,
                SimulationSet::Resolution,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            clock::advance_clock_from_fixed_time
                .run_if(clock::clock_follows_fixed_time)
                .in_set(SimulationSet::Clock),
        );

        // Подсистемы
        app.add_plugins((CombatPlugin, AIPlugin, PlayerPlugin));

        app.add_systems(
            FixedUpdate,
            lifecycle::deactivate_out_of_bounds
                .in_set(SimulationSet::Resolution)
                .after(ai::patrol::update_patrols),
        );
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Часы в режиме `External`: тики двигает `step`.
pub fn create_headless_app(seed: u64) -> App {
    let config = SimulationConfig {
        clock: ClockMode::External,
        ..Default::default()
    };
    create_headless_app_with_config(seed, config)
}

pub fn create_headless_app_with_config(seed: u64, config: SimulationConfig) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(config)
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Один simulation тик длиной `delta_ms` (External clock)
///
/// После тика ротирует буферы событий, как это делает `First` в `app.update()`:
/// событие живёт два тика, читать его нужно через `EventCursor` / `EventReader`.
pub fn step(app: &mut App, delta_ms: u64) {
    let world = app.world_mut();
    world.resource_mut::<SimulationClock>().advance(delta_ms);
    world.run_schedule(FixedUpdate);

    if let Err(err) = world.run_system_cached(event_update_system) {
        logger::log_error(&format!("Event buffer rotation failed: {}", err));
    }
}

/// Player entity со всем необходимым для управления
pub fn player_bundle(config: &SimulationConfig, position: Vec2) -> impl Bundle {
    (
        Actor::player(),
        Health::new(config.player.max_health),
        Kinematics::at(position),
        Facing::Right,
        Hurtbox::new(Vec2::from(config.player.standing_extents)),
        PlayerController::from_config(config),
        ProjectilePool::new(
            config.projectile.pool_capacity,
            Vec2::from(config.projectile.half_extents),
        ),
        MeleeWeapon::from_tuning(&config.melee),
    )
}

/// Патрулирующий враг
pub fn enemy_bundle(config: &SimulationConfig, position: Vec2, facing: Facing) -> impl Bundle {
    (
        Actor::enemy(),
        Health::new(config.enemy.max_health),
        Kinematics::at(position),
        facing,
        Hurtbox::new(Vec2::from(config.enemy.half_extents)),
        ContactDamage(config.enemy.contact_damage),
        ScoreValue(config.enemy.score_value),
        PatrolState::from_tuning(&config.patrol, facing),
    )
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
