//! Gameplay tuning (загружается один раз на старте)
//!
//! Значения по умолчанию:
//! stun 1000ms, player speed 150, projectile 300/700/10, patrol turn 700ms.
//! TOML файл может переопределить любое поле (`#[serde(default)]`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Ошибки загрузки конфигурации
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Кто двигает `SimulationClock`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    /// Host вызывает `SimulationClock::advance` перед каждым тиком
    External,
    /// Часы берутся из `Time<Fixed>` (обычный Bevy app)
    #[default]
    FixedTimestep,
}

/// Корневой конфиг симуляции (Resource)
#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub clock: ClockMode,
    pub combat: CombatTuning,
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
    pub melee: MeleeTuning,
    pub patrol: PatrolTuning,
    pub enemy: EnemyTuning,
    pub world: WorldTuning,
}

/// Hit-stun и knockback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Длительность hit-stun (invincibility window)
    pub stun_duration_ms: u64,
    /// Скорость отбрасывания при ударе (по x и вверх)
    pub knockback_velocity: f32,
    /// Множитель knockback для environmental hazards (нет физического тела)
    pub hazard_knockback_factor: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            stun_duration_ms: 1000,
            knockback_velocity: 250.0,
            hazard_knockback_factor: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_health: u32,
    /// Горизонтальная скорость (units/sec)
    pub speed: f32,
    pub jump_velocity: f32,
    /// Сколько прыжков разрешено в воздухе до касания земли
    pub max_aerial_jumps: u32,
    /// Half extents стоячего hurtbox (20x36 body)
    pub standing_extents: [f32; 2],
    /// Half extents во время slide
    pub crouch_extents: [f32; 2],
    /// Анимация броска (primary attack gate)
    pub throw_animation: String,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100,
            speed: 150.0,
            jump_velocity: 150.0 * 1.8,
            max_aerial_jumps: 1,
            standing_extents: [10.0, 18.0],
            crouch_extents: [10.0, 9.0],
            throw_animation: "throw".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    pub pool_capacity: usize,
    pub speed: f32,
    pub damage: u32,
    pub max_range: f32,
    /// Смещение точки вылета от центра стрелка по facing
    pub muzzle_offset: f32,
    pub half_extents: [f32; 2],
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            pool_capacity: 5,
            speed: 300.0,
            damage: 10,
            max_range: 700.0,
            muzzle_offset: 10.0,
            half_extents: [6.0, 4.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeTuning {
    pub damage: u32,
    /// Минимальный интервал между swing'ами
    pub attack_speed_ms: u64,
    /// Offset hitbox'а при facing = Right (зеркалится для Left)
    pub offset: [f32; 2],
    pub half_extents: [f32; 2],
    pub animation: String,
}

impl Default for MeleeTuning {
    fn default() -> Self {
        Self {
            damage: 15,
            attack_speed_ms: 1000,
            offset: [20.0, 0.0],
            half_extents: [14.0, 12.0],
            animation: "swing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolTuning {
    pub speed: f32,
    /// Дистанция до принудительного разворота (в единицах `distance_unit`)
    pub max_distance: f32,
    /// Прибавка к дистанции за каждый тик на земле
    pub distance_unit: f32,
    /// Hysteresis: минимум между двумя разворотами
    pub min_turn_interval_ms: u64,
    pub ray_steepness: f32,
    pub ray_length: f32,
}

impl Default for PatrolTuning {
    fn default() -> Self {
        Self {
            speed: 100.0,
            max_distance: 3.0,
            distance_unit: 1.0,
            min_turn_interval_ms: 700,
            ray_steepness: 0.4,
            ray_length: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub max_health: u32,
    pub contact_damage: u32,
    pub score_value: u32,
    /// Half extents (20x45 body)
    pub half_extents: [f32; 2],
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            max_health: 40,
            contact_damage: 10,
            score_value: 10,
            half_extents: [10.0, 22.5],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsTuning {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Используется только headless физикой
    pub gravity: f32,
    /// Playable bounds; None = без ограничений
    pub bounds: Option<BoundsTuning>,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            gravity: 500.0,
            bounds: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Проверка инвариантов, которые ядро не умеет обойти в runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.projectile.pool_capacity == 0 {
            return Err(invalid("projectile.pool_capacity", "must be at least 1"));
        }
        if !(self.projectile.max_range > 0.0) {
            return Err(invalid("projectile.max_range", "must be positive"));
        }
        // Снаряд со скоростью 0 не набирает дистанцию и держит слот пула вечно
        if !(self.projectile.speed > 0.0) {
            return Err(invalid("projectile.speed", "must be positive"));
        }
        if self.player.speed < 0.0 || self.patrol.speed < 0.0 {
            return Err(invalid("speed", "speeds are magnitudes and must be non-negative"));
        }
        if !(self.patrol.distance_unit > 0.0) {
            return Err(invalid("patrol.distance_unit", "must be positive"));
        }
        if self.player.max_health == 0 || self.enemy.max_health == 0 {
            return Err(invalid("max_health", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.combat.hazard_knockback_factor) {
            return Err(invalid("combat.hazard_knockback_factor", "must be within 0..=1"));
        }
        if let Some(bounds) = &self.world.bounds {
            if bounds.min[0] >= bounds.max[0] || bounds.min[1] >= bounds.max[1] {
                return Err(invalid("world.bounds", "min must be below max on both axes"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning() {
        let config = SimulationConfig::default();
        assert_eq!(config.combat.stun_duration_ms, 1000);
        assert_eq!(config.player.speed, 150.0);
        assert_eq!(config.projectile.pool_capacity, 5);
        assert_eq!(config.projectile.max_range, 700.0);
        assert_eq!(config.patrol.min_turn_interval_ms, 700);
        assert_eq!(config.patrol.ray_steepness, 0.4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            clock = "external"

            [patrol]
            max_distance = 1000.0

            [projectile]
            pool_capacity = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.clock, ClockMode::External);
        assert_eq!(config.patrol.max_distance, 1000.0);
        assert_eq!(config.patrol.speed, 100.0);
        assert_eq!(config.projectile.pool_capacity, 8);
        assert_eq!(config.projectile.damage, 10);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SimulationConfig::from_toml_str("[projectile]\npool_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "projectile.pool_capacity", .. }));
    }

    #[test]
    fn test_stationary_projectile_rejected() {
        let err = SimulationConfig::from_toml_str("[projectile]\nspeed = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "projectile.speed", .. }));

        let err = SimulationConfig::from_toml_str("[projectile]\nspeed = -5.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "projectile.speed", .. }));
    }

    #[test]
    fn test_bad_bounds_rejected() {
        let err = SimulationConfig::from_toml_str(
            "[world.bounds]\nmin = [0.0, 0.0]\nmax = [0.0, 100.0]\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "world.bounds", .. }));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = SimulationConfig::from_toml_str("clock = 42").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
