//! Ground patrol AI
//!
//! Один state: Walking со знаковой скоростью (знак = направление).
//! Разворот: переход, а не отдельный state.
//!
//! Per tick (только на земле):
//! 1. traveled += distance_unit
//! 2. forward raycast по platform layer (ledge detection)
//! 3. разворот, если (ledge ИЛИ traveled ≥ max) И прошёл min turn interval
//!
//! Hysteresis (min turn interval) защищает от дёрганья на границе платформы.

use bevy::prelude::*;

use crate::clock::{SimulationClock, Timestamp};
use crate::combat::CombatState;
use crate::components::{Actor, Deactivated, Defeated, Facing, GroundContact, Hurtbox, Kinematics};
use crate::config::PatrolTuning;
use crate::spatial::{CollisionLayer, ForwardProbe, SpatialQueries};

/// Состояние патруля врага
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PatrolState {
    /// Знаковая скорость: > 0 вправо, < 0 влево
    pub speed: f32,
    /// Дистанция с последнего разворота
    pub traveled: f32,
    pub max_distance: f32,
    pub distance_unit: f32,
    /// None: ещё ни разу не разворачивался
    pub last_turn: Option<Timestamp>,
    pub min_turn_interval_ms: u64,
    pub steepness: f32,
    pub ray_length: f32,
}

impl Default for PatrolState {
    fn default() -> Self {
        Self::from_tuning(&PatrolTuning::default(), Facing::Right)
    }
}

/// Что произошло за тик патруля
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolStep {
    /// Не на земле: тик пропущен
    Idle,
    Walking,
    Turned(Facing),
}

/// Event: патруль развернулся (для flip анимации)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnEvent {
    pub enemy: Entity,
    pub new_direction: Facing,
}

impl PatrolState {
    pub fn from_tuning(tuning: &PatrolTuning, facing: Facing) -> Self {
        Self {
            speed: tuning.speed * facing.sign(),
            traveled: 0.0,
            max_distance: tuning.max_distance,
            distance_unit: tuning.distance_unit,
            last_turn: None,
            min_turn_interval_ms: tuning.min_turn_interval_ms,
            steepness: tuning.ray_steepness,
            ray_length: tuning.ray_length,
        }
    }

    pub fn direction(&self) -> Facing {
        Facing::from_sign(self.speed)
    }

    /// Hysteresis: разворот разрешён не чаще min_turn_interval
    pub fn can_turn(&self, now: Timestamp) -> bool {
        self.last_turn
            .map_or(true, |last| last.elapsed_by(now, self.min_turn_interval_ms))
    }

    /// Forward raycast из `origin` по текущему направлению
    pub fn probe(&self, origin: Vec2) -> ForwardProbe {
        ForwardProbe {
            origin,
            facing: self.direction(),
            layer: CollisionLayer::Platforms,
            steepness: self.steepness,
            length: self.ray_length,
        }
    }

    /// Один тик патруля
    ///
    /// `ground_ahead` отвечает на forward probe (true = впереди есть пол).
    pub fn tick(
        &mut self,
        now: Timestamp,
        on_ground: bool,
        origin: Vec2,
        ground_ahead: impl FnOnce(&ForwardProbe) -> bool,
    ) -> PatrolStep {
        if !on_ground {
            return PatrolStep::Idle;
        }

        self.traveled += self.distance_unit;
        let ledge = !ground_ahead(&self.probe(origin));
        let worn_out = self.traveled >= self.max_distance;

        if (ledge || worn_out) && self.can_turn(now) {
            PatrolStep::Turned(self.turn(now))
        } else {
            PatrolStep::Walking
        }
    }

    /// Разворот: flip скорости, сброс дистанции, запоминаем время
    pub fn turn(&mut self, now: Timestamp) -> Facing {
        self.speed = -self.speed;
        self.traveled = 0.0;
        self.last_turn = Some(now);
        self.direction()
    }
}

/// Система: патрулирование врагов
///
/// Пропускает stunned (knockback velocity не трогаем), defeated и
/// deactivated. Пишет velocity.x = speed на каждом тике на земле.
pub fn update_patrols(
    mut patrols: Query<
        (Entity, &mut PatrolState, &mut Kinematics, &mut Facing, &Hurtbox, &GroundContact, &CombatState),
        (With<Actor>, Without<Defeated>, Without<Deactivated>),
    >,
    spatial: Res<SpatialQueries>,
    clock: Res<SimulationClock>,
    mut turn_events: EventWriter<TurnEvent>,
) {
    for (entity, mut patrol, mut kinematics, mut facing, hurtbox, ground, combat) in patrols.iter_mut() {
        if combat.is_stunned_at(clock.now) {
            continue;
        }

        // Луч идёт от ног
        let origin = kinematics.position - Vec2::new(0.0, hurtbox.half_extents.y);
        let step = patrol.tick(clock.now, ground.on_ground, origin, |probe| {
            spatial.raycast_forward(entity, probe).hit
        });

        match step {
            PatrolStep::Idle => continue,
            PatrolStep::Walking => {}
            PatrolStep::Turned(new_direction) => {
                turn_events.write(TurnEvent {
                    enemy: entity,
                    new_direction,
                });
                crate::logger::log(&format!("↩️ Patrol {:?} turned {:?}", entity, new_direction));
            }
        }

        *facing = patrol.direction();
        kinematics.velocity.x = patrol.speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patrol(max_distance: f32) -> PatrolState {
        let tuning = PatrolTuning {
            max_distance,
            ..Default::default()
        };
        PatrolState::from_tuning(&tuning, Facing::Right)
    }

    #[test]
    fn test_off_ground_is_noop() {
        let mut state = patrol(3.0);
        let step = state.tick(Timestamp(0), false, Vec2::ZERO, |_| false);

        assert_eq!(step, PatrolStep::Idle);
        assert_eq!(state.traveled, 0.0);
        assert_eq!(state.speed, 100.0);
    }

    #[test]
    fn test_ledge_triggers_first_turn() {
        let mut state = patrol(1000.0);
        let step = state.tick(Timestamp(16), true, Vec2::ZERO, |_| false);

        assert_eq!(step, PatrolStep::Turned(Facing::Left));
        assert_eq!(state.speed, -100.0);
        assert_eq!(state.traveled, 0.0);
        assert_eq!(state.last_turn, Some(Timestamp(16)));
    }

    #[test]
    fn test_probe_follows_direction() {
        let mut state = patrol(1000.0);
        assert_eq!(state.probe(Vec2::ZERO).facing, Facing::Right);
        assert_eq!(state.probe(Vec2::ZERO).layer, CollisionLayer::Platforms);

        state.turn(Timestamp(0));
        let probe = state.probe(Vec2::new(50.0, 0.0));
        assert_eq!(probe.facing, Facing::Left);
        assert!(probe.end().x < 50.0);
        assert!(probe.end().y < 0.0);
    }

    #[test]
    fn test_hysteresis_with_both_conditions_always_true() {
        // Ledge каждый тик + max_distance меньше одного шага
        let mut state = patrol(0.5);
        let mut turns = Vec::new();

        for tick in 0..300u64 {
            let now = Timestamp(tick * 16);
            if let PatrolStep::Turned(_) = state.tick(now, true, Vec2::ZERO, |_| false) {
                turns.push(now);
            }
        }

        assert!(turns.len() > 1);
        for pair in turns.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= 700, "turns too close: {:?}", pair);
        }
    }

    #[test]
    fn test_turn_boundary_is_inclusive() {
        let mut state = patrol(1000.0);
        state.turn(Timestamp(0));

        assert!(!state.can_turn(Timestamp(699)));
        assert!(state.can_turn(Timestamp(700)));
    }

    #[test]
    fn test_max_distance_flips_exactly_once() {
        let mut state = patrol(1000.0);
        let mut turns = 0;

        for tick in 1..=1500u64 {
            let step = state.tick(Timestamp(tick * 16), true, Vec2::ZERO, |_| true);
            if let PatrolStep::Turned(direction) = step {
                turns += 1;
                assert_eq!(tick, 1000);
                assert_eq!(direction, Facing::Left);
                assert_eq!(state.traveled, 0.0);
            }
        }

        assert_eq!(turns, 1);
        assert_eq!(state.speed, -100.0);
        assert_eq!(state.traveled, 500.0);
    }
}
