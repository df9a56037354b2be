//! Simulation clock: монотонное время в миллисекундах
//!
//! Все "ожидания" в ядре (hit-stun, cooldown атак, интервал разворота патруля)
//! это сравнения timestamp'ов с `SimulationClock::now`. Никаких таймеров
//! и отложенных callback'ов внутри симуляции.

use bevy::prelude::*;
use std::ops::Add;

use crate::config::{ClockMode, SimulationConfig};

/// Момент симуляционного времени (ms от старта)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Reflect)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Прошло ли `interval_ms` с этого момента к `now`
    pub fn elapsed_by(&self, now: Timestamp, interval_ms: u64) -> bool {
        now.0 >= self.0.saturating_add(interval_ms)
    }
}

impl Add<u64> for Timestamp {
    type Output = Timestamp;

    fn add(self, ms: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(ms))
    }
}

/// Текущее время симуляции + длительность последнего тика
///
/// Host двигает часы сам (`ClockMode::External`) либо ядро берёт их
/// из `Time<Fixed>` (`ClockMode::FixedTimestep`).
#[derive(Resource, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Resource)]
pub struct SimulationClock {
    pub now: Timestamp,
    pub delta_ms: u64,
}

impl SimulationClock {
    pub fn advance(&mut self, delta_ms: u64) {
        self.now = self.now + delta_ms;
        self.delta_ms = delta_ms;
    }

    /// Delta последнего тика в секундах (для интеграции скоростей)
    pub fn delta_secs(&self) -> f32 {
        self.delta_ms as f32 / 1000.0
    }
}

/// Run condition: часы ведёт Bevy fixed timestep
pub fn clock_follows_fixed_time(config: Res<SimulationConfig>) -> bool {
    config.clock == ClockMode::FixedTimestep
}

/// Система: синхронизация `SimulationClock` с `Time<Fixed>`
pub fn advance_clock_from_fixed_time(time: Res<Time<Fixed>>, mut clock: ResMut<SimulationClock>) {
    let elapsed = Timestamp(time.elapsed().as_millis() as u64);
    clock.delta_ms = elapsed.0.saturating_sub(clock.now.0);
    clock.now = elapsed;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advance() {
        let mut clock = SimulationClock::default();
        clock.advance(16);
        clock.advance(17);

        assert_eq!(clock.now, Timestamp(33));
        assert_eq!(clock.delta_ms, 17);
    }

    #[test]
    fn test_delta_secs() {
        let mut clock = SimulationClock::default();
        clock.advance(500);
        assert_eq!(clock.delta_secs(), 0.5);
    }

    #[test]
    fn test_elapsed_by_is_inclusive() {
        let hit_at = Timestamp(0);
        assert!(!hit_at.elapsed_by(Timestamp(999), 1000));
        assert!(hit_at.elapsed_by(Timestamp(1000), 1000));
    }

    #[test]
    fn test_timestamp_add_saturates() {
        assert_eq!(Timestamp(u64::MAX) + 5, Timestamp(u64::MAX));
    }
}
