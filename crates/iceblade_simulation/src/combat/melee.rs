//! Melee weapon + transient hitbox
//!
//! # Flow
//!
//! ```text
//! AttackSecondary intent → MeleeWeapon::swing (cooldown gate)
//!   ↓
//! AttackStarted event → host играет swing анимацию
//!   ↓
//! Пока AnimationState::is_playing(weapon.animation) → hitbox активен
//!   ↓
//! detect_melee_hits → HitReport → resolve_hits
//! ```
//!
//! Длительность окна принадлежит animation system'е host'а,
//! ядро только спрашивает "играет ли анимация".

use bevy::prelude::*;

use crate::clock::Timestamp;
use crate::components::{Actor, AnimationState, Deactivated, Defeated, Facing, Hurtbox, Kinematics};
use crate::config::MeleeTuning;
use crate::outcome::Rejection;
use crate::spatial::{Aabb, SpatialQueries};

use super::damage::{AttackSource, ContactSide, HitReport};

/// Melee оружие актора
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct MeleeWeapon {
    pub damage: u32,
    /// Минимальный интервал между swing'ами (ms)
    pub attack_speed_ms: u64,
    pub last_swing: Option<Timestamp>,
    /// Offset hitbox'а при facing = Right
    pub offset: Vec2,
    pub half_extents: Vec2,
    /// Анимация, которая держит hitbox активным
    pub animation: String,
    /// Кого уже ударили этим swing'ом (no double-hits)
    pub struck: Vec<Entity>,
}

impl Default for MeleeWeapon {
    fn default() -> Self {
        Self {
            damage: 15,
            attack_speed_ms: 1000,
            last_swing: None,
            offset: Vec2::new(20.0, 0.0),
            half_extents: Vec2::new(14.0, 12.0),
            animation: "swing".to_string(),
            struck: Vec::new(),
        }
    }
}

/// Hit volume одного swing'а (существует только пока анимация играет)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeHitbox {
    pub owner: Entity,
    pub damage: u32,
    pub volume: Aabb,
}

impl MeleeWeapon {
    pub fn from_tuning(tuning: &MeleeTuning) -> Self {
        Self {
            damage: tuning.damage,
            attack_speed_ms: tuning.attack_speed_ms,
            last_swing: None,
            offset: Vec2::from(tuning.offset),
            half_extents: Vec2::from(tuning.half_extents),
            animation: tuning.animation.clone(),
            struck: Vec::new(),
        }
    }

    pub fn can_swing(&self, now: Timestamp) -> bool {
        match self.last_swing {
            Some(last) => last.elapsed_by(now, self.attack_speed_ms),
            None => true,
        }
    }

    /// Начать swing. `OnCooldown` если не прошло `attack_speed_ms`.
    pub fn swing(&mut self, now: Timestamp) -> Result<(), Rejection> {
        if !self.can_swing(now) {
            return Err(Rejection::OnCooldown);
        }
        self.last_swing = Some(now);
        self.struck.clear();
        Ok(())
    }

    /// Offset с учётом facing (зеркалится по x)
    pub fn facing_offset(&self, facing: Facing) -> Vec2 {
        Vec2::new(self.offset.x * facing.sign(), self.offset.y)
    }

    /// Hitbox, если атакующая анимация сейчас играет
    pub fn hitbox(
        &self,
        owner: Entity,
        position: Vec2,
        facing: Facing,
        animation: &AnimationState,
    ) -> Option<MeleeHitbox> {
        if self.last_swing.is_none() || !animation.is_playing(&self.animation) {
            return None;
        }

        Some(MeleeHitbox {
            owner,
            damage: self.damage,
            volume: Aabb::new(position + self.facing_offset(facing), self.half_extents),
        })
    }
}

/// Система: overlap активных melee hitbox'ов с враждебными акторами
pub fn detect_melee_hits(
    mut attackers: Query<
        (Entity, &Actor, &Kinematics, &Facing, &AnimationState, &mut MeleeWeapon),
        (Without<Defeated>, Without<Deactivated>),
    >,
    targets: Query<(Entity, &Actor, &Kinematics, &Hurtbox), (Without<Defeated>, Without<Deactivated>)>,
    spatial: Res<SpatialQueries>,
    mut hit_events: EventWriter<HitReport>,
) {
    for (attacker, attacker_actor, kinematics, facing, animation, mut weapon) in attackers.iter_mut() {
        let Some(hitbox) = weapon.hitbox(attacker, kinematics.position, *facing, animation) else {
            continue;
        };

        for (defender, defender_actor, defender_kinematics, hurtbox) in targets.iter() {
            if defender == attacker || !attacker_actor.is_hostile_to(defender_actor) {
                continue;
            }
            if weapon.struck.contains(&defender) {
                continue;
            }
            if !spatial.overlaps(&hitbox.volume, &hurtbox.aabb(defender_kinematics.position)) {
                continue;
            }

            weapon.struck.push(defender);
            hit_events.write(HitReport {
                defender,
                source: AttackSource::Melee {
                    attacker,
                    damage: hitbox.damage,
                },
                side: ContactSide::from_positions(kinematics.position.x, defender_kinematics.position.x),
            });

            crate::logger::log(&format!(
                "🗡️ Melee hitbox of {:?} overlaps {:?}",
                attacker, defender
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swinging() -> AnimationState {
        AnimationState {
            playing: Some("swing".to_string()),
        }
    }

    #[test]
    fn test_swing_cooldown() {
        let mut weapon = MeleeWeapon::default();

        assert!(weapon.swing(Timestamp(0)).is_ok());
        assert_eq!(weapon.swing(Timestamp(999)), Err(Rejection::OnCooldown));
        assert_eq!(weapon.last_swing, Some(Timestamp(0)));

        assert!(weapon.swing(Timestamp(1000)).is_ok());
        assert_eq!(weapon.last_swing, Some(Timestamp(1000)));
    }

    #[test]
    fn test_swing_clears_struck_list() {
        let mut weapon = MeleeWeapon::default();
        weapon.struck.push(Entity::from_raw(3));
        weapon.swing(Timestamp(0)).unwrap();
        assert!(weapon.struck.is_empty());
    }

    #[test]
    fn test_offset_mirrors_with_facing() {
        let weapon = MeleeWeapon::default();
        assert_eq!(weapon.facing_offset(Facing::Right), Vec2::new(20.0, 0.0));
        assert_eq!(weapon.facing_offset(Facing::Left), Vec2::new(-20.0, 0.0));
    }

    #[test]
    fn test_hitbox_only_while_animation_plays() {
        let mut weapon = MeleeWeapon::default();
        let owner = Entity::from_raw(1);

        // Ещё не было swing'а
        assert!(weapon.hitbox(owner, Vec2::ZERO, Facing::Right, &swinging()).is_none());

        weapon.swing(Timestamp(0)).unwrap();
        assert!(weapon
            .hitbox(owner, Vec2::ZERO, Facing::Right, &AnimationState::default())
            .is_none());

        let hitbox = weapon
            .hitbox(owner, Vec2::new(100.0, 0.0), Facing::Left, &swinging())
            .unwrap();
        assert_eq!(hitbox.volume.center, Vec2::new(80.0, 0.0));
        assert_eq!(hitbox.damage, 15);
        assert_eq!(hitbox.owner, owner);
    }
}
