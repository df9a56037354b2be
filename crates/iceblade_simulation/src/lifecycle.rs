//! Entity lifecycle: выход за playable bounds
//!
//! Defeat помечает `resolve_hits`; здесь: только bounds check.
//! Оба перехода идемпотентны: повторная деактивация ничего не делает.

use bevy::prelude::*;

use crate::components::{Actor, Deactivated, Kinematics};
use crate::config::WorldTuning;
use crate::spatial::Aabb;

/// Прямоугольник, внутри которого актор считается живым участником сцены
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlayableBounds(pub Aabb);

impl PlayableBounds {
    pub fn from_corners(min: Vec2, max: Vec2) -> Self {
        Self(Aabb::new((min + max) * 0.5, (max - min) * 0.5))
    }

    /// None, если bounds в конфиге не заданы
    pub fn from_tuning(world: &WorldTuning) -> Option<Self> {
        world
            .bounds
            .as_ref()
            .map(|bounds| Self::from_corners(Vec2::from(bounds.min), Vec2::from(bounds.max)))
    }

    pub fn contains(&self, position: Vec2) -> bool {
        self.0.contains_point(position)
    }
}

/// Event: актор выведен из симуляции
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDeactivated {
    pub entity: Entity,
}

/// Система: деактивация акторов за пределами `PlayableBounds`
///
/// Без ресурса `PlayableBounds` ничего не делает.
pub fn deactivate_out_of_bounds(
    mut commands: Commands,
    bounds: Option<Res<PlayableBounds>>,
    actors: Query<(Entity, &Kinematics), (With<Actor>, Without<Deactivated>)>,
    mut deactivated_events: EventWriter<EntityDeactivated>,
) {
    let Some(bounds) = bounds else {
        return;
    };

    for (entity, kinematics) in actors.iter() {
        if bounds.contains(kinematics.position) {
            continue;
        }

        commands.entity(entity).insert(Deactivated);
        deactivated_events.write(EntityDeactivated { entity });
        crate::logger::log_info(&format!(
            "🚪 {:?} left playable bounds at {:?}",
            entity, kinematics.position
        ));
    }
}
