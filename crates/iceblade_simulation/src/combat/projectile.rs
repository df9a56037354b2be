//! Projectile pool: fixed-capacity переиспользуемые снаряды
//!
//! Lifecycle слота:
//! ```text
//! dormant ──fire──▶ active ──┬─ traveled ≥ max_range ─▶ dormant (OutOfRange)
//!                            ├─ confirmed hit ────────▶ dormant (Hit)
//!                            └─ host: terrain block ──▶ dormant (Terrain)
//! ```
//! Деактивация всегда сбрасывает слот в zero-state (traveled = 0).
//! Range expiry отрабатывает ДО hit detection в том же тике: снаряд,
//! вышедший за дальность, урон уже не наносит.

use bevy::prelude::*;

use crate::components::{Actor, Deactivated, Defeated, Facing, Hurtbox, Kinematics};
use crate::outcome::Rejection;
use crate::spatial::{Aabb, SpatialQueries};

use super::damage::{AttackSource, ContactSide, HitReport};

/// Ссылка на слот пула (weak: только для атрибуции и recycle)
///
/// `generation` растёт при каждом fire, поэтому старый handle
/// не может случайно погасить уже переиспользованный слот.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct ProjectileHandle {
    pub owner: Entity,
    pub slot: u16,
    pub generation: u32,
}

/// Один слот пула
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Projectile {
    pub active: bool,
    pub position: Vec2,
    /// Signed горизонтальная скорость (знак = направление)
    pub velocity: f32,
    pub damage: u32,
    pub traveled: f32,
    pub max_range: f32,
    pub owner: Option<Entity>,
    generation: u32,
}

impl Projectile {
    fn dormant(generation: u32) -> Self {
        Self {
            active: false,
            position: Vec2::ZERO,
            velocity: 0.0,
            damage: 0,
            traveled: 0.0,
            max_range: 0.0,
            owner: None,
            generation,
        }
    }

    pub fn remaining_range(&self) -> f32 {
        self.max_range - self.traveled
    }

    pub fn direction(&self) -> Facing {
        Facing::from_sign(self.velocity)
    }

    pub fn is_out_of_range(&self) -> bool {
        self.traveled >= self.max_range
    }

    /// Сброс в dormant zero-state (generation сохраняется)
    fn reset(&mut self) {
        *self = Projectile::dormant(self.generation);
    }
}

/// Почему снаряд вернулся в пул
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ExpiryReason {
    OutOfRange,
    Hit,
    Terrain,
}

/// Event: снаряд выпущен (render/pool bookkeeping)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ProjectileFired {
    pub handle: ProjectileHandle,
    pub position: Vec2,
    pub direction: Facing,
}

/// Event: снаряд вернулся в пул
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectileExpired {
    pub handle: ProjectileHandle,
    pub reason: ExpiryReason,
}

/// Event: host обнаружил столкновение снаряда с terrain (Host → ECS)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectileBlocked {
    pub handle: ProjectileHandle,
}

/// Пул снарядов, принадлежит стреляющему entity (weapon system)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ProjectilePool {
    slots: Vec<Projectile>,
    /// Размер hit volume каждого снаряда
    pub half_extents: Vec2,
}

impl Default for ProjectilePool {
    fn default() -> Self {
        Self::new(5, Vec2::new(6.0, 4.0))
    }
}

impl ProjectilePool {
    pub fn new(capacity: usize, half_extents: Vec2) -> Self {
        // slot хранится в u16 внутри handle
        let capacity = capacity.min(u16::MAX as usize);
        Self {
            slots: vec![Projectile::dormant(0); capacity],
            half_extents,
        }
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|p| p.active).count()
    }

    pub fn is_exhausted(&self) -> bool {
        self.slots.iter().all(|p| p.active)
    }

    /// Активирует первый dormant слот
    ///
    /// `Unavailable` если все слоты заняты (состояние пула не меняется),
    /// `NoOp` если `range` ≤ 0 (такой снаряд истёк бы мгновенно).
    pub fn fire(
        &mut self,
        owner: Entity,
        origin: Vec2,
        direction: Facing,
        speed: f32,
        damage: u32,
        range: f32,
    ) -> Result<ProjectileHandle, Rejection> {
        if !(range > 0.0) {
            return Err(Rejection::NoOp);
        }

        let (slot, projectile) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, p)| !p.active)
            .ok_or(Rejection::Unavailable)?;

        let generation = projectile.generation.wrapping_add(1);
        *projectile = Projectile {
            active: true,
            position: origin,
            velocity: speed.abs() * direction.sign(),
            damage,
            traveled: 0.0,
            max_range: range,
            owner: Some(owner),
            generation,
        };

        Ok(ProjectileHandle {
            owner,
            slot: slot as u16,
            generation,
        })
    }

    /// Двигает активные снаряды и гасит вышедшие за дальность
    ///
    /// Возвращает handles истёкших в этом тике снарядов.
    pub fn advance(&mut self, delta_secs: f32) -> Vec<ProjectileHandle> {
        let mut expired = Vec::new();

        for (slot, projectile) in self.slots.iter_mut().enumerate() {
            if !projectile.active {
                continue;
            }

            let dx = projectile.velocity * delta_secs;
            projectile.position.x += dx;
            projectile.traveled += dx.abs();

            if projectile.is_out_of_range() {
                if let Some(owner) = projectile.owner {
                    expired.push(ProjectileHandle {
                        owner,
                        slot: slot as u16,
                        generation: projectile.generation,
                    });
                }
                projectile.reset();
            }
        }

        expired
    }

    /// Возврат снаряда в пул (hit / terrain)
    ///
    /// Idempotent: неактивный или устаревший handle → `false`, no-op.
    pub fn recycle(&mut self, handle: ProjectileHandle) -> bool {
        match self.slots.get_mut(handle.slot as usize) {
            Some(projectile) if projectile.active && projectile.generation == handle.generation => {
                projectile.reset();
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, handle: ProjectileHandle) -> Option<&Projectile> {
        self.slots
            .get(handle.slot as usize)
            .filter(|p| p.active && p.generation == handle.generation)
    }

    pub fn is_active(&self, handle: ProjectileHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Активные снаряды вместе с их handles
    pub fn active(&self) -> impl Iterator<Item = (ProjectileHandle, &Projectile)> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, p)| {
            let owner = p.owner.filter(|_| p.active)?;
            Some((
                ProjectileHandle {
                    owner,
                    slot: slot as u16,
                    generation: p.generation,
                },
                p,
            ))
        })
    }

    pub fn hit_volume(&self, projectile: &Projectile) -> Aabb {
        Aabb::new(projectile.position, self.half_extents)
    }
}

/// Система: движение снарядов + range expiry
///
/// Работает в Physics фазе, т.е. строго до hit detection.
pub fn advance_projectiles(
    mut pools: Query<&mut ProjectilePool>,
    clock: Res<crate::clock::SimulationClock>,
    mut expired_events: EventWriter<ProjectileExpired>,
) {
    let delta = clock.delta_secs();
    if delta <= 0.0 {
        return;
    }

    for mut pool in pools.iter_mut() {
        if pool.active_count() == 0 {
            continue;
        }

        for handle in pool.advance(delta) {
            expired_events.write(ProjectileExpired {
                handle,
                reason: ExpiryReason::OutOfRange,
            });
        }
    }
}

/// Система: host сообщил о попадании в terrain → recycle
pub fn recycle_blocked_projectiles(
    mut blocked_events: EventReader<ProjectileBlocked>,
    mut pools: Query<&mut ProjectilePool>,
    mut expired_events: EventWriter<ProjectileExpired>,
) {
    for blocked in blocked_events.read() {
        let Ok(mut pool) = pools.get_mut(blocked.handle.owner) else {
            continue;
        };

        if pool.recycle(blocked.handle) {
            expired_events.write(ProjectileExpired {
                handle: blocked.handle,
                reason: ExpiryReason::Terrain,
            });
        }
    }
}

/// Система: overlap активных снарядов с враждебными акторами
///
/// Каждый снаряд бьёт максимум одну цель за тик (ближайшую).
/// Recycle делает `resolve_hits`: только при подтверждённом попадании.
pub fn detect_projectile_hits(
    pools: Query<&ProjectilePool>,
    owners: Query<&Actor>,
    targets: Query<(Entity, &Actor, &Kinematics, &Hurtbox), (Without<Defeated>, Without<Deactivated>)>,
    spatial: Res<SpatialQueries>,
    mut hit_events: EventWriter<HitReport>,
) {
    for pool in pools.iter() {
        for (handle, projectile) in pool.active() {
            let Ok(owner_actor) = owners.get(handle.owner) else {
                continue;
            };
            let volume = pool.hit_volume(projectile);

            let target = targets
                .iter()
                .filter(|(entity, actor, ..)| *entity != handle.owner && owner_actor.is_hostile_to(actor))
                .filter(|(_, _, kinematics, hurtbox)| spatial.overlaps(&volume, &hurtbox.aabb(kinematics.position)))
                .min_by(|a, b| {
                    let da = a.2.position.distance_squared(projectile.position);
                    let db = b.2.position.distance_squared(projectile.position);
                    da.total_cmp(&db).then(a.0.cmp(&b.0))
                });

            if let Some((defender, ..)) = target {
                hit_events.write(HitReport {
                    defender,
                    source: AttackSource::Projectile {
                        handle,
                        damage: projectile.damage,
                    },
                    // Снаряд летит вправо → прилетел с левой стороны цели
                    side: match projectile.direction() {
                        Facing::Right => ContactSide::Left,
                        Facing::Left => ContactSide::Right,
                    },
                });
            }
        }
    }
}
