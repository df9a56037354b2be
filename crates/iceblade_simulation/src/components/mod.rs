//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые характеристики (kind, health, facing, kinematics, hurtbox)
//! - movement: intent stream от input layer'а (Intent, IntentEvent, IntentFrame)

pub mod actor;
pub mod movement;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
