//! Intent stream: дискретные команды от input layer'а
//!
//! Host шлёт `IntentEvent` каждый тик, пока кнопка держится
//! (move-left / move-right / jump-pressed). Rising edge прыжка ядро
//! определяет само. Attack и crouch: одиночные события.

use bevy::prelude::*;

/// Вид intent'а (без payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    JumpPressed,
    AttackPrimary,
    AttackSecondary,
    CrouchStart,
    CrouchEnd,
}

/// Event: intent для конкретного entity
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentEvent {
    pub entity: Entity,
    pub intent: Intent,
}

impl IntentEvent {
    pub fn new(entity: Entity, intent: Intent) -> Self {
        Self { entity, intent }
    }
}

/// Все intents одного entity за тик
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentFrame {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub attack_primary: bool,
    pub attack_secondary: bool,
    pub crouch_start: bool,
    pub crouch_end: bool,
}

impl IntentFrame {
    pub fn push(&mut self, intent: Intent) {
        match intent {
            Intent::MoveLeft => self.move_left = true,
            Intent::MoveRight => self.move_right = true,
            Intent::JumpPressed => self.jump = true,
            Intent::AttackPrimary => self.attack_primary = true,
            Intent::AttackSecondary => self.attack_secondary = true,
            Intent::CrouchStart => self.crouch_start = true,
            Intent::CrouchEnd => self.crouch_end = true,
        }
    }

    pub fn from_intents(intents: impl IntoIterator<Item = Intent>) -> Self {
        let mut frame = Self::default();
        for intent in intents {
            frame.push(intent);
        }
        frame
    }

    /// Горизонтальное направление: при обоих нажатых побеждает left
    pub fn horizontal(&self) -> Option<crate::components::Facing> {
        if self.move_left {
            Some(crate::components::Facing::Left)
        } else if self.move_right {
            Some(crate::components::Facing::Right)
        } else {
            None
        }
    }
}
