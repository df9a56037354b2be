//! Spatial queries: граница между ядром и физикой движка
//!
//! Host (engine adapter) отвечает за:
//! - ground contact → пишет `GroundContact` компонент после своей физики
//! - raycast против collision layer → `SpatialQuery::raycast_forward`
//! - overlap test → `SpatialQuery::overlaps` (по умолчанию AABB)
//!
//! Ядро только спрашивает, геометрию не хранит.

use bevy::prelude::*;

use crate::components::Facing;

/// Axis-aligned bounding box (center + half extents)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Касание граней считается пересечением
    pub fn intersects(&self, other: &Aabb) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        delta.x <= reach.x && delta.y <= reach.y
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        let delta = (point - self.center).abs();
        delta.x <= self.half_extents.x && delta.y <= self.half_extents.y
    }
}

/// Collision layer, против которого идёт raycast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum CollisionLayer {
    /// Платформы / пол уровня
    Platforms,
}

/// Параметры forward raycast'а патруля
///
/// Луч идёт из `origin` вперёд по facing и вниз с наклоном `steepness`
/// (dy/dx), длина по x = `length`.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ForwardProbe {
    pub origin: Vec2,
    pub facing: Facing,
    pub layer: CollisionLayer,
    pub steepness: f32,
    pub length: f32,
}

impl ForwardProbe {
    /// Конечная точка луча (y вверх, поэтому вниз = минус)
    pub fn end(&self) -> Vec2 {
        let dx = self.length * self.facing.sign();
        Vec2::new(self.origin.x + dx, self.origin.y - self.length * self.steepness)
    }
}

/// Отрезок луча (для debug-визуализации на стороне host'а)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct RaySegment {
    pub start: Vec2,
    pub end: Vec2,
}

/// Результат raycast'а
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct RaycastHit {
    pub hit: bool,
    pub ray: RaySegment,
}

/// Geometric queries, которые ядро делегирует движку
pub trait SpatialQuery: Send + Sync {
    /// Forward raycast против collision layer (ledge detection у патруля)
    fn raycast_forward(&self, entity: Entity, probe: &ForwardProbe) -> RaycastHit;

    /// Bounding overlap test
    fn overlaps(&self, a: &Aabb, b: &Aabb) -> bool {
        a.intersects(b)
    }
}

/// Injected spatial backend (Resource)
#[derive(Resource)]
pub struct SpatialQueries(pub Box<dyn SpatialQuery>);

impl SpatialQueries {
    pub fn new(query: impl SpatialQuery + 'static) -> Self {
        Self(Box::new(query))
    }
}

impl Default for SpatialQueries {
    fn default() -> Self {
        Self::new(OpenGround)
    }
}

impl std::ops::Deref for SpatialQueries {
    type Target = dyn SpatialQuery;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Бесконечный пол без обрывов: raycast всегда попадает
///
/// Backend по умолчанию, пока host не поставил свой.
pub struct OpenGround;

impl SpatialQuery for OpenGround {
    fn raycast_forward(&self, _entity: Entity, probe: &ForwardProbe) -> RaycastHit {
        RaycastHit {
            hit: true,
            ray: RaySegment {
                start: probe.origin,
                end: probe.end(),
            },
        }
    }
}
