//! Player domain: управление игроком через intent stream

use bevy::prelude::*;

use crate::components::IntentEvent;
use crate::SimulationSet;

pub mod controller;

pub use controller::{AttackKind, AttackStarted, PlayerController, ThrowSpec};

/// Player Plugin
///
/// Intents применяются в начале тика (SimulationSet::Intents),
/// до физики и hit detection.
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<IntentEvent>()
            .add_event::<AttackStarted>();

        app.add_systems(
            FixedUpdate,
            controller::apply_player_intents.in_set(SimulationSet::Intents),
        );
    }
}
