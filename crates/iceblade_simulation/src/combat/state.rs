//! CombatState: hit-stun state machine (общий для игрока и врагов)
//!
//! Normal ──hit──▶ HitStunned ──now ≥ hit_stun_until──▶ Normal
//!
//! Пока entity в hit-stun, она игнорирует новый урон и все intents
//! (кроме уже начатого knockback).

use bevy::prelude::*;

use crate::clock::Timestamp;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub struct CombatState {
    pub is_hit_stunned: bool,
    pub hit_stun_until: Timestamp,
}

impl CombatState {
    /// Stunned ли entity в момент `now` (с учётом истечения окна)
    pub fn is_stunned_at(&self, now: Timestamp) -> bool {
        self.is_hit_stunned && now < self.hit_stun_until
    }

    /// Вход в hit-stun. Повторный вход при активном stun невозможен.
    pub fn enter_hit_stun(&mut self, now: Timestamp, duration_ms: u64) -> bool {
        if self.is_stunned_at(now) {
            return false;
        }
        self.is_hit_stunned = true;
        self.hit_stun_until = now + duration_ms;
        true
    }

    /// Снимает stun, если окно истекло. `true` ровно один раз на каждый stun.
    pub fn expire(&mut self, now: Timestamp) -> bool {
        if self.is_hit_stunned && now >= self.hit_stun_until {
            self.is_hit_stunned = false;
            return true;
        }
        false
    }
}

/// Event: hit-stun закончился (host снимает tint / мигание)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitStunEnded {
    pub entity: Entity,
}

/// Система: снятие истёкших hit-stun окон
pub fn expire_hit_stun(
    mut states: Query<(Entity, &mut CombatState)>,
    clock: Res<crate::clock::SimulationClock>,
    mut ended_events: EventWriter<HitStunEnded>,
) {
    for (entity, mut state) in states.iter_mut() {
        // Не трогаем Changed<CombatState> без надобности
        if !state.is_hit_stunned || clock.now < state.hit_stun_until {
            continue;
        }

        if state.expire(clock.now) {
            ended_events.write(HitStunEnded { entity });
            crate::logger::log(&format!("Hit-stun ended for {:?} at {}ms", entity, clock.now.0));
        }
    }
}
