//! Combat system module
//!
//! ECS ответственность:
//! - Game state: Health, CombatState (hit-stun), ProjectilePool, MeleeWeapon
//! - Combat rules: damage resolution, knockback, defeat, score
//! - Events: DamageEvent, EntityDefeated, ProjectileFired/Expired, ScoreChanged
//!
//! Host ответственность:
//! - Физика: интеграция позиций, ground contact, terrain коллизии снарядов
//! - Анимации: сколько длится swing/throw (AnimationState)

use bevy::prelude::*;

use crate::SimulationSet;

pub mod damage;
pub mod melee;
pub mod projectile;
pub mod state;


// Re-export основных типов
pub use damage::{
    resolve_hit, AttackSource, ContactSide, DamageEvent, Defender, EntityDefeated, HitReport, HitResolution, Score,
    ScoreChanged,
};
pub use melee::{MeleeHitbox, MeleeWeapon};
pub use projectile::{
    ExpiryReason, Projectile, ProjectileBlocked, ProjectileExpired, ProjectileFired, ProjectileHandle, ProjectilePool,
};
pub use state::{CombatState, HitStunEnded};

/// Combat Plugin
///
/// Порядок выполнения внутри тика (FixedUpdate):
/// 1. Physics: advance_projectiles (движение + range expiry)
/// 2. Collision: expire_hit_stun → terrain blocks → hit detection
///    (projectile, melee, body contact)
/// 3. Resolution: resolve_hits (урон, knockback, recycle, defeat, score)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<HitReport>()
            .add_event::<DamageEvent>()
            .add_event::<EntityDefeated>()
            .add_event::<ScoreChanged>()
            .add_event::<HitStunEnded>()
            .add_event::<ProjectileFired>()
            .add_event::<ProjectileExpired>()
            .add_event::<ProjectileBlocked>()
            .init_resource::<Score>();

        app.add_systems(
            FixedUpdate,
            projectile::advance_projectiles.in_set(SimulationSet::Physics),
        );

        app.add_systems(
            FixedUpdate,
            (
                state::expire_hit_stun,
                projectile::recycle_blocked_projectiles,
                projectile::detect_projectile_hits,
                melee::detect_melee_hits,
                damage::detect_body_contacts,
            )
                .chain()
                .in_set(SimulationSet::Collision),
        );

        app.add_systems(
            FixedUpdate,
            damage::resolve_hits.in_set(SimulationSet::Resolution),
        );
    }
}
