//! Общие helpers для integration тестов
//!
//! `step` ротирует буферы событий каждый тик, поэтому события,
//! которые тест проверяет в конце сессии, копятся в `Recorded<E>`.

#![allow(dead_code)]

use bevy::prelude::*;
use iceblade_simulation::SimulationSet;

/// Все события `E`, прочитанные за время теста
#[derive(Resource)]
pub struct Recorded<E: Event>(pub Vec<E>);

fn record_events<E: Event + Clone>(mut reader: EventReader<E>, mut recorded: ResMut<Recorded<E>>) {
    recorded.0.extend(reader.read().cloned());
}

/// Подписывает App на запись событий `E` (в конце каждого тика)
pub fn record<E: Event + Clone>(app: &mut App) {
    app.insert_resource(Recorded::<E>(Vec::new()));
    app.add_systems(FixedUpdate, record_events::<E>.after(SimulationSet::Resolution));
}

pub fn recorded<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world().resource::<Recorded<E>>().0.clone()
}
