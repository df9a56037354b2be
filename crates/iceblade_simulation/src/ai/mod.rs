//! Enemy AI module
//!
//! Пока один контроллер: ground patrol с ledge detection.

use bevy::prelude::*;

use crate::SimulationSet;

pub mod patrol;

// Re-export основных типов
pub use patrol::{PatrolState, PatrolStep, TurnEvent};

/// AI Plugin
///
/// Patrol идёт в Resolution после resolve_hits: враг, получивший удар
/// в этом тике, уже stunned и патруль его не трогает.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TurnEvent>();

        app.add_systems(
            FixedUpdate,
            patrol::update_patrols
                .in_set(SimulationSet::Resolution)
                .after(crate::combat::damage::resolve_hits),
        );
    }
}
