//! Headless host layer (тесты + headless binary)
//!
//! То, что в игре делает движок:
//! - `FlatTerrain`: пол из сегментов с провалами, реализует `SpatialQuery`
//! - гравитация + посадка на пол → `Kinematics.position`, `GroundContact`
//! - таймер анимаций атак (`AttackStarted` → `AnimationState`)

use bevy::prelude::*;
use rand::Rng;

use crate::clock::{SimulationClock, Timestamp};
use crate::components::{Actor, AnimationState, Deactivated, GroundContact, Hurtbox, Kinematics, WorldCollision};
use crate::config::SimulationConfig;
use crate::player::AttackStarted;
use crate::spatial::{ForwardProbe, RaySegment, RaycastHit, SpatialQueries, SpatialQuery};
use crate::{DeterministicRng, SimulationSet};

/// Параметры генерации уровня
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainParams {
    pub start_x: f32,
    pub length: f32,
    pub floor_y: f32,
    pub min_segment: f32,
    pub max_segment: f32,
    pub min_gap: f32,
    pub max_gap: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            start_x: -200.0,
            length: 4000.0,
            floor_y: 0.0,
            min_segment: 300.0,
            max_segment: 600.0,
            min_gap: 40.0,
            max_gap: 120.0,
        }
    }
}

/// Плоский пол на высоте `floor_y`, разбитый на сегменты `[start, end]`
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTerrain {
    pub floor_y: f32,
    pub segments: Vec<(f32, f32)>,
}

impl FlatTerrain {
    /// Сплошной пол без провалов
    pub fn solid(floor_y: f32) -> Self {
        Self {
            floor_y,
            segments: vec![(f32::MIN, f32::MAX)],
        }
    }

    pub fn from_segments(floor_y: f32, segments: Vec<(f32, f32)>) -> Self {
        Self { floor_y, segments }
    }

    /// Детерминированная генерация (одинаковый seed → одинаковый уровень)
    pub fn generate(rng: &mut impl Rng, params: &TerrainParams) -> Self {
        let mut segments = Vec::new();
        let end_x = params.start_x + params.length;
        let mut x = params.start_x;

        while x < end_x {
            let width = rng.gen_range(params.min_segment..=params.max_segment);
            let segment_end = (x + width).min(end_x);
            segments.push((x, segment_end));
            x = segment_end + rng.gen_range(params.min_gap..=params.max_gap);
        }

        Self {
            floor_y: params.floor_y,
            segments,
        }
    }

    /// Есть ли пол под координатой x
    pub fn has_floor_at(&self, x: f32) -> bool {
        self.segments.iter().any(|(start, end)| x >= *start && x <= *end)
    }

    /// Точка внутри твёрдого пола (на поверхности или ниже)
    pub fn is_solid(&self, point: Vec2) -> bool {
        point.y <= self.floor_y && self.has_floor_at(point.x)
    }
}

impl SpatialQuery for FlatTerrain {
    fn raycast_forward(&self, _entity: Entity, probe: &ForwardProbe) -> RaycastHit {
        let end = probe.end();
        RaycastHit {
            hit: self.is_solid(end),
            ray: RaySegment {
                start: probe.origin,
                end,
            },
        }
    }
}

/// Текущий уровень headless симуляции
#[derive(Resource, Debug, Clone)]
pub struct HeadlessTerrain(pub FlatTerrain);

/// Длительности анимаций атак (ms)
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct AnimationDurations {
    pub throw_ms: u64,
    pub swing_ms: u64,
}

impl Default for AnimationDurations {
    fn default() -> Self {
        Self {
            throw_ms: 300,
            swing_ms: 400,
        }
    }
}

/// Когда закончится текущая анимация
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayingClip {
    pub ends_at: Timestamp,
}

/// Система: гравитация, интеграция и посадка на пол
///
/// Акторы с `WorldCollision(false)` проваливаются сквозь пол.
pub fn integrate_headless_physics(
    mut actors: Query<(&mut Kinematics, &mut GroundContact, &Hurtbox, &WorldCollision), (With<Actor>, Without<Deactivated>)>,
    terrain: Res<HeadlessTerrain>,
    clock: Res<SimulationClock>,
    config: Res<SimulationConfig>,
) {
    let dt = clock.delta_secs();
    let floor_y = terrain.0.floor_y;

    for (mut kinematics, mut ground, hurtbox, collision) in actors.iter_mut() {
        kinematics.velocity.y -= config.world.gravity * dt;
        let previous_feet = kinematics.position.y - hurtbox.half_extents.y;
        let velocity = kinematics.velocity;
        kinematics.position += velocity * dt;

        let feet = kinematics.position.y - hurtbox.half_extents.y;
        let landed = collision.0
            && kinematics.velocity.y <= 0.0
            && previous_feet >= floor_y
            && feet <= floor_y
            && terrain.0.has_floor_at(kinematics.position.x);

        if landed {
            kinematics.position.y = floor_y + hurtbox.half_extents.y;
            kinematics.velocity.y = 0.0;
        }
        ground.on_ground = landed;
    }
}

/// Система: `AttackStarted` → анимация играет `duration` ms
pub fn play_attack_animations(
    mut commands: Commands,
    mut attacks: EventReader<AttackStarted>,
    mut animations: Query<&mut AnimationState>,
    durations: Res<AnimationDurations>,
    config: Res<SimulationConfig>,
    clock: Res<SimulationClock>,
) {
    for attack in attacks.read() {
        let Ok(mut animation) = animations.get_mut(attack.entity) else {
            continue;
        };

        let duration = if attack.animation == config.player.throw_animation {
            durations.throw_ms
        } else {
            durations.swing_ms
        };

        animation.playing = Some(attack.animation.clone());
        commands.entity(attack.entity).insert(PlayingClip {
            ends_at: clock.now + duration,
        });
    }
}

/// Система: остановка закончившихся анимаций
pub fn finish_animations(
    mut commands: Commands,
    mut clips: Query<(Entity, &PlayingClip, &mut AnimationState)>,
    clock: Res<SimulationClock>,
) {
    for (entity, clip, mut animation) in clips.iter_mut() {
        if clock.now >= clip.ends_at {
            animation.playing = None;
            commands.entity(entity).remove::<PlayingClip>();
        }
    }
}

/// Headless host plugin
///
/// Генерирует уровень из `DeterministicRng` и ставит его как `SpatialQueries`.
/// Добавлять после `SimulationPlugin`.
pub struct HeadlessPlugin {
    pub terrain: TerrainParams,
}

impl Default for HeadlessPlugin {
    fn default() -> Self {
        Self {
            terrain: TerrainParams::default(),
        }
    }
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let terrain = {
            let world = app.world_mut();
            if !world.contains_resource::<DeterministicRng>() {
                world.insert_resource(DeterministicRng::new(42));
            }
            let mut rng = world.resource_mut::<DeterministicRng>();
            FlatTerrain::generate(&mut rng.rng, &self.terrain)
        };

        crate::logger::log_info(&format!(
            "🗺️ Headless terrain: {} segments, floor y={}",
            terrain.segments.len(),
            terrain.floor_y
        ));

        app.insert_resource(SpatialQueries::new(terrain.clone()))
            .insert_resource(HeadlessTerrain(terrain))
            .init_resource::<AnimationDurations>();

        app.add_systems(
            FixedUpdate,
            (integrate_headless_physics, finish_animations, play_attack_animations)
                .chain()
                .in_set(SimulationSet::Physics)
                .before(crate::combat::projectile::advance_projectiles),
        );
    }
}

/// Подменить уровень (тесты со своей геометрией)
pub fn replace_terrain(world: &mut World, terrain: FlatTerrain) {
    world.insert_resource(SpatialQueries::new(terrain.clone()));
    world.insert_resource(HeadlessTerrain(terrain));
}
