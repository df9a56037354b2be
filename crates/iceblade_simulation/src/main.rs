//! Headless симуляция ICEBLADE
//!
//! Запускает scripted сессию (1000 тиков) без рендера:
//! игрок бежит вправо, бросает снаряды и бьёт, враги патрулируют.
//!
//! Использование: `iceblade_simulation [config.toml]`

use bevy::prelude::*;
use iceblade_simulation::logger::{log_error, log_info};
use iceblade_simulation::*;

const TICK_MS: u64 = 16;
const TICKS: u64 = 1000;

fn main() {
    let seed = 42;
    init_logger();

    let mut config = match std::env::args().nth(1) {
        Some(path) => match SimulationConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log_error(&format!("❌ Config {}: {}", path, err));
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };
    // Тики двигаем сами
    config.clock = ClockMode::External;

    log_info(&format!("Starting ICEBLADE headless simulation (seed: {})", seed));

    let mut app = create_headless_app_with_config(seed, config.clone());
    app.add_plugins((SimulationPlugin, HeadlessPlugin::default()));

    let floor_y = app.world().resource::<headless::HeadlessTerrain>().0.floor_y;
    let player_y = floor_y + config.player.standing_extents[1];
    let enemy_y = floor_y + config.enemy.half_extents[1];

    let player = app.world_mut().spawn(player_bundle(&config, Vec2::new(0.0, player_y))).id();
    for x in [250.0, 600.0, 1100.0] {
        app.world_mut().spawn(enemy_bundle(&config, Vec2::new(x, enemy_y), Facing::Left));
    }

    // Буферы событий ротируются каждый step: считаем на ходу
    let mut damage_cursor = app.world().resource::<Events<DamageEvent>>().get_cursor();
    let mut turn_cursor = app.world().resource::<Events<TurnEvent>>().get_cursor();
    let mut damage_events = 0;
    let mut turns = 0;

    for tick in 0..TICKS {
        for intent in scripted_intents(tick) {
            app.world_mut().send_event(IntentEvent::new(player, intent));
        }

        step(&mut app, TICK_MS);

        let world = app.world();
        damage_events += damage_cursor.read(world.resource::<Events<DamageEvent>>()).count();
        turns += turn_cursor.read(world.resource::<Events<TurnEvent>>()).count();

        if tick % 100 == 0 {
            let health = world.get::<Health>(player).map(|h| h.current).unwrap_or(0);
            let position = world.get::<Kinematics>(player).map(|k| k.position).unwrap_or_default();
            log_info(&format!(
                "Tick {}: player hp={} pos=({:.1}, {:.1}) score={}",
                tick,
                health,
                position.x,
                position.y,
                world.resource::<Score>().total
            ));
        }
    }

    let world = app.world();
    log_info(&format!(
        "Simulation complete at {}ms! damage events: {}, patrol turns: {}, score: {}",
        world.resource::<SimulationClock>().now.as_millis(),
        damage_events,
        turns,
        world.resource::<Score>().total
    ));
}

/// Скрипт ввода: бег вправо, бросок каждые 30 тиков, удар каждые 45, прыжок каждые 90
fn scripted_intents(tick: u64) -> Vec<Intent> {
    let mut intents = vec![Intent::MoveRight];
    if tick % 30 == 0 {
        intents.push(Intent::AttackPrimary);
    }
    if tick % 45 == 0 {
        intents.push(Intent::AttackSecondary);
    }
    if tick % 90 == 0 {
        intents.push(Intent::JumpPressed);
    }
    intents
}
