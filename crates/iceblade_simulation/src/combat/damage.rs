//! Damage resolution
//!
//! Все источники урона (снаряд, melee, касание телом, hazard) сводятся
//! к `HitReport`, который обрабатывает одна система `resolve_hits`.
//! Сама логика удара: чистая функция `resolve_hit`.
//!
//! Урон по видам источника (фиксированный порядок, без fallback-цепочек):
//! - Projectile: урон снаряда
//! - Melee: урон `MeleeWeapon`
//! - Body: `ContactDamage` атакующего
//! - Hazard: урон, заявленный host'ом

use bevy::prelude::*;

use crate::clock::{SimulationClock, Timestamp};
use crate::components::{
    Actor, ActorKind, ContactDamage, Deactivated, Defeated, Health, Hurtbox, Kinematics,
    ScoreValue, WorldCollision,
};
use crate::config::{CombatTuning, SimulationConfig};
use crate::outcome::Rejection;
use crate::spatial::SpatialQueries;

use super::state::CombatState;
use super::projectile::{ExpiryReason, ProjectileExpired, ProjectileHandle, ProjectilePool};

/// С какой стороны защищающегося произошёл контакт
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ContactSide {
    Left,
    Right,
}

impl ContactSide {
    /// Атакующий правее защищающегося → контакт справа
    pub fn from_positions(attacker_x: f32, defender_x: f32) -> Self {
        if attacker_x > defender_x {
            ContactSide::Right
        } else {
            ContactSide::Left
        }
    }

    /// Знак knockback по x: прочь от стороны контакта
    pub fn push_sign(&self) -> f32 {
        match self {
            ContactSide::Left => 1.0,
            ContactSide::Right => -1.0,
        }
    }
}

/// Источник удара
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum AttackSource {
    /// Снаряд из пула (после подтверждённого попадания возвращается в пул)
    Projectile { handle: ProjectileHandle, damage: u32 },
    /// Melee hitbox
    Melee { attacker: Entity, damage: u32 },
    /// Касание телом (contact damage врага)
    Body { attacker: Entity, damage: u32 },
    /// Environmental hazard: физического тела нет, knockback ослаблен
    Hazard { damage: u32 },
}

impl AttackSource {
    pub fn damage(&self) -> u32 {
        match *self {
            AttackSource::Projectile { damage, .. }
            | AttackSource::Melee { damage, .. }
            | AttackSource::Body { damage, .. }
            | AttackSource::Hazard { damage } => damage,
        }
    }

    /// Кому засчитывается удар
    pub fn attacker(&self) -> Option<Entity> {
        match *self {
            AttackSource::Projectile { handle, .. } => Some(handle.owner),
            AttackSource::Melee { attacker, .. } | AttackSource::Body { attacker, .. } => Some(attacker),
            AttackSource::Hazard { .. } => None,
        }
    }

    pub fn projectile(&self) -> Option<ProjectileHandle> {
        match *self {
            AttackSource::Projectile { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn has_body(&self) -> bool {
        !matches!(self, AttackSource::Hazard { .. })
    }
}

/// Event: обнаружено попадание (detection → resolution)
///
/// Пишут detection системы ядра и host (hazards, свои коллизии).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitReport {
    pub defender: Entity,
    pub source: AttackSource,
    pub side: ContactSide,
}

/// Event: урон нанесён (HUD, анимации)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    pub defender: Entity,
    pub attacker: Option<Entity>,
    /// Реально снятое здоровье (clamp на 0)
    pub amount: u32,
    pub remaining_health: u32,
    pub defeated: bool,
}

/// Event: health дошёл до 0
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDefeated {
    pub entity: Entity,
    pub by: Option<Entity>,
}

/// Event: изменение счёта
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChanged {
    pub delta: u32,
    pub total: u32,
}

/// Счёт игрока
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Resource)]
pub struct Score {
    pub total: u32,
}

/// Мутабельный вид защищающегося для `resolve_hit`
pub struct Defender<'a> {
    pub entity: Entity,
    pub health: &'a mut Health,
    pub combat: &'a mut CombatState,
    pub kinematics: &'a mut Kinematics,
}

/// Результат принятого удара
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResolution {
    pub event: DamageEvent,
    /// Снаряд, который надо вернуть в пул
    pub recycle: Option<ProjectileHandle>,
    pub knockback: Vec2,
}

/// Применяет удар к защищающемуся
///
/// - `Ignored`, если защищающийся в hit-stun или уже побеждён
/// - иначе: hit-stun, урон (clamp 0), knockback прочь от стороны контакта
///   (у hazard половинная скорость), при 0 health defeat + подброс вверх
pub fn resolve_hit(
    defender: Defender<'_>,
    hit: &HitReport,
    now: Timestamp,
    tuning: &CombatTuning,
) -> Result<HitResolution, Rejection> {
    // Истёкшее окно снимаем здесь же: удар ровно на границе засчитывается
    defender.combat.expire(now);

    if !defender.health.is_alive() || defender.combat.is_stunned_at(now) {
        return Err(Rejection::Ignored);
    }

    defender.combat.enter_hit_stun(now, tuning.stun_duration_ms);
    let amount = defender.health.take_damage(hit.source.damage());
    let defeated = !defender.health.is_alive();

    let factor = if hit.source.has_body() {
        1.0
    } else {
        tuning.hazard_knockback_factor
    };
    let strength = tuning.knockback_velocity * factor;
    let mut knockback = Vec2::new(hit.side.push_sign() * strength, strength);
    if defeated {
        // Defeated всегда подбрасывается вверх полной скоростью
        knockback.y = tuning.knockback_velocity;
    }
    defender.kinematics.velocity = knockback;

    Ok(HitResolution {
        event: DamageEvent {
            defender: defender.entity,
            attacker: hit.source.attacker(),
            amount,
            remaining_health: defender.health.current,
            defeated,
        },
        recycle: hit.source.projectile(),
        knockback,
    })
}

/// Система: касание телом (враги с `ContactDamage` → враждебные акторы)
pub fn detect_body_contacts(
    attackers: Query<(Entity, &Actor, &Kinematics, &Hurtbox, &ContactDamage), (Without<Defeated>, Without<Deactivated>)>,
    targets: Query<(Entity, &Actor, &Kinematics, &Hurtbox, &CombatState), (Without<Defeated>, Without<Deactivated>)>,
    spatial: Res<SpatialQueries>,
    clock: Res<SimulationClock>,
    mut hit_events: EventWriter<HitReport>,
) {
    for (defender, defender_actor, defender_kinematics, defender_hurtbox, combat) in targets.iter() {
        // Пока stun активен, удары всё равно будут Ignored
        if combat.is_stunned_at(clock.now) {
            continue;
        }

        let defender_box = defender_hurtbox.aabb(defender_kinematics.position);

        let contact = attackers.iter().find(|(attacker, actor, kinematics, hurtbox, damage)| {
            *attacker != defender
                && damage.0 > 0
                && actor.is_hostile_to(defender_actor)
                && spatial.overlaps(&hurtbox.aabb(kinematics.position), &defender_box)
        });

        if let Some((attacker, _, kinematics, _, damage)) = contact {
            hit_events.write(HitReport {
                defender,
                source: AttackSource::Body {
                    attacker,
                    damage: damage.0,
                },
                side: ContactSide::from_positions(kinematics.position.x, defender_kinematics.position.x),
            });
        }
    }
}

/// Система: применение всех HitReport этого тика
///
/// 1. Отбрасываем устаревшие снаряды и friendly fire
/// 2. `resolve_hit` → DamageEvent
/// 3. Побочные эффекты: recycle снаряда, defeat, score
pub fn resolve_hits(
    mut commands: Commands,
    mut hit_events: EventReader<HitReport>,
    mut defenders: Query<
        (&Actor, &mut Health, &mut CombatState, &mut Kinematics, &mut WorldCollision, Option<&ScoreValue>),
        (Without<Defeated>, Without<Deactivated>),
    >,
    actors: Query<&Actor>,
    mut pools: Query<&mut ProjectilePool>,
    clock: Res<SimulationClock>,
    config: Res<SimulationConfig>,
    mut score: ResMut<Score>,
    mut damage_events: EventWriter<DamageEvent>,
    mut expired_events: EventWriter<ProjectileExpired>,
    mut defeated_events: EventWriter<EntityDefeated>,
    mut score_events: EventWriter<ScoreChanged>,
) {
    for hit in hit_events.read() {
        // Снаряд мог уже попасть в другую цель в этом же тике
        if let Some(handle) = hit.source.projectile() {
            let still_flying = pools.get(handle.owner).map(|pool| pool.is_active(handle)).unwrap_or(false);
            if !still_flying {
                continue;
            }
        }

        let attacker_kind = hit.source.attacker().and_then(|attacker| actors.get(attacker).ok()).map(|a| a.kind);

        let Ok((actor, mut health, mut combat, mut kinematics, mut world_collision, score_value)) =
            defenders.get_mut(hit.defender)
        else {
            continue;
        };

        if hit.source.attacker() == Some(hit.defender) {
            crate::logger::log_warning(&format!("⚠️ Self-hit dropped for {:?}", hit.defender));
            continue;
        }
        if attacker_kind == Some(actor.kind) {
            continue;
        }

        let defender = Defender {
            entity: hit.defender,
            health: &mut *health,
            combat: &mut *combat,
            kinematics: &mut *kinematics,
        };

        let resolution = match resolve_hit(defender, hit, clock.now, &config.combat) {
            Ok(resolution) => resolution,
            Err(reason) => {
                crate::logger::log(&format!("Hit on {:?} rejected: {}", hit.defender, reason));
                continue;
            }
        };

        damage_events.write(resolution.event);
        crate::logger::log(&format!(
            "💥 {:?} took {} damage (HP: {})",
            hit.defender, resolution.event.amount, resolution.event.remaining_health
        ));

        if let Some(handle) = resolution.recycle {
            if let Ok(mut pool) = pools.get_mut(handle.owner) {
                if pool.recycle(handle) {
                    expired_events.write(ProjectileExpired {
                        handle,
                        reason: ExpiryReason::Hit,
                    });
                }
            }
        }

        if !resolution.event.defeated {
            continue;
        }

        // Terminal state: input/AI отключаются, коллизия с миром выключена.
        // Удаление из сцены делает host.
        world_collision.0 = false;
        commands.entity(hit.defender).insert(Defeated);
        defeated_events.write(EntityDefeated {
            entity: hit.defender,
            by: resolution.event.attacker,
        });
        crate::logger::log_info(&format!("☠️ {:?} defeated by {:?}", hit.defender, resolution.event.attacker));

        if actor.kind == ActorKind::Enemy && attacker_kind == Some(ActorKind::Player) {
            if let Some(ScoreValue(delta)) = score_value.copied() {
                score.total = score.total.saturating_add(delta);
                score_events.write(ScoreChanged {
                    delta,
                    total: score.total,
                });
            }
        }
    }
}
