//! Typed outcomes for rejected actions
//!
//! Ни одна из этих ситуаций не фатальна: вызывающий код просто ничего
//! не делает (no-op). Исключений/паник в ядре нет.

use thiserror::Error;

/// Почему действие не выполнено
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// В пуле нет свободного (dormant) снаряда
    #[error("no dormant projectile slot available")]
    Unavailable,

    /// Атака раньше, чем закончился cooldown
    #[error("attack is on cooldown")]
    OnCooldown,

    /// Удар по entity в hit-stun (или уже побеждённой)
    #[error("hit ignored: defender cannot take damage right now")]
    Ignored,

    /// Действие запрещено в текущем состоянии (slide, stun, defeated)
    #[error("action not allowed in current state")]
    NoOp,
}
