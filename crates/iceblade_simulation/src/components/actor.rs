//! Базовые компоненты акторов: Actor, Health, Facing, Kinematics, Hurtbox

use bevy::prelude::*;

use crate::combat::CombatState;
use crate::spatial::Aabb;

/// Сторона актора (для friendly-fire фильтра и score)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum ActorKind {
    #[default]
    Player,
    Enemy,
}

/// Актор (игрок или враг): базовый компонент для живых существ
///
/// Автоматически добавляет остальное состояние через Required Components.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Health, CombatState, Kinematics, Facing, Hurtbox, GroundContact, AnimationState, WorldCollision)]
pub struct Actor {
    pub kind: ActorKind,
}

impl Actor {
    pub fn player() -> Self {
        Self {
            kind: ActorKind::Player,
        }
    }

    pub fn enemy() -> Self {
        Self {
            kind: ActorKind::Enemy,
        }
    }

    /// Может ли источник этой стороны ранить `other`
    pub fn is_hostile_to(&self, other: &Actor) -> bool {
        self.kind != other.kind
    }
}

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Возвращает реально снятое количество (clamp на 0)
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.current);
        self.current -= applied;
        applied
    }
}

/// Направление взгляда
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
#[reflect(Component)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(&self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(&self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// Facing по знаку скорости (0 → Right)
    pub fn from_sign(value: f32) -> Facing {
        if value < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        }
    }
}

/// Позиция + скорость (y вверх)
///
/// Ядро пишет velocity (intent, knockback, patrol), host интегрирует
/// физику и пишет position обратно.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Kinematics {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }
}

/// Collision extents актора (меняются во время slide)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Hurtbox {
    pub half_extents: Vec2,
}

impl Default for Hurtbox {
    fn default() -> Self {
        Self {
            half_extents: Vec2::new(10.0, 18.0),
        }
    }
}

impl Hurtbox {
    pub fn new(half_extents: Vec2) -> Self {
        Self { half_extents }
    }

    pub fn aabb(&self, position: Vec2) -> Aabb {
        Aabb::new(position, self.half_extents)
    }
}

/// Урон при касании телом (враги)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub struct ContactDamage(pub u32);

/// Очки за победу над актором
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub struct ScoreValue(pub u32);

/// Ground contact: пишет host после своей физики
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub struct GroundContact {
    pub on_ground: bool,
}

/// Какая анимация сейчас играет (пишет animation layer host'а)
///
/// Ядро только спрашивает `is_playing(name)`: gate для primary attack
/// и окно активного melee hitbox'а.
#[derive(Component, Debug, Clone, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub struct AnimationState {
    pub playing: Option<String>,
}

impl AnimationState {
    pub fn is_playing(&self, name: &str) -> bool {
        self.playing.as_deref() == Some(name)
    }
}

/// Коллизия с миром (host читает; defeated актор проваливается сквозь пол)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct WorldCollision(pub bool);

impl Default for WorldCollision {
    fn default() -> Self {
        Self(true)
    }
}

/// Маркер: health дошёл до 0, актор больше не принимает input/AI
///
/// Удаление из сцены: забота host'а.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Defeated;

/// Маркер: актор выведен из симуляции (вышел за playable bounds)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Deactivated;
