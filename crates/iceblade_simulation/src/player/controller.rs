//! Player controller: intents → locomotion, jump, slide, attacks
//!
//! Правила:
//! - move: vx = ±speed (нет move intent → 0), facing меняется только от движения
//! - jump: только rising edge; на земле всегда, в воздухе пока не
//!   исчерпан `max_aerial_jumps`; касание земли сбрасывает счётчик
//! - slide (crouch): только с земли, меняет hurtbox, блокирует
//!   locomotion и атаки до crouch-end
//! - primary attack: gate "throw анимация играет" → `ProjectilePool::fire`
//! - secondary attack: `MeleeWeapon::swing` (свой cooldown)
//! - hit-stun / defeated: все intents NoOp, кроме crouch-end

use bevy::prelude::*;
use std::collections::HashMap;

use crate::clock::SimulationClock;
use crate::combat::{CombatState, MeleeWeapon, ProjectileFired, ProjectilePool};
use crate::components::{
    AnimationState, Deactivated, Defeated, Facing, GroundContact, Hurtbox, IntentEvent, IntentFrame, Kinematics,
};
use crate::config::SimulationConfig;
use crate::outcome::Rejection;

/// Параметры снаряда, который бросает игрок
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ThrowSpec {
    pub speed: f32,
    pub damage: u32,
    pub range: f32,
    /// Смещение точки вылета от центра по facing
    pub muzzle_offset: f32,
}

/// Вид атаки (для AttackStarted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum AttackKind {
    Projectile,
    Melee,
}

/// Event: атака началась, host должен проиграть анимацию
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct AttackStarted {
    pub entity: Entity,
    pub kind: AttackKind,
    pub animation: String,
}

/// Контроллер игрока
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
#[require(ProjectilePool, MeleeWeapon)]
pub struct PlayerController {
    pub speed: f32,
    pub jump_velocity: f32,
    pub max_aerial_jumps: u32,
    /// Прыжков в воздухе с последнего касания земли
    pub aerial_jumps: u32,
    /// Jump был зажат в прошлом тике (rising edge detection)
    pub jump_held: bool,
    pub is_sliding: bool,
    pub standing_extents: Vec2,
    pub crouch_extents: Vec2,
    pub throw_animation: String,
    pub throw: ThrowSpec,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

impl PlayerController {
    pub fn from_config(config: &SimulationConfig) -> Self {
        let player = &config.player;
        let projectile = &config.projectile;
        Self {
            speed: player.speed,
            jump_velocity: player.jump_velocity,
            max_aerial_jumps: player.max_aerial_jumps,
            aerial_jumps: 0,
            jump_held: false,
            is_sliding: false,
            standing_extents: Vec2::from(player.standing_extents),
            crouch_extents: Vec2::from(player.crouch_extents),
            throw_animation: player.throw_animation.clone(),
            throw: ThrowSpec {
                speed: projectile.speed,
                damage: projectile.damage,
                range: projectile.max_range,
                muzzle_offset: projectile.muzzle_offset,
            },
        }
    }

    /// Касание земли сбрасывает счётчик aerial jumps
    pub fn touch_ground(&mut self, on_ground: bool) {
        if on_ground {
            self.aerial_jumps = 0;
        }
    }

    /// Rising edge jump'а. Вызывать каждый тик, даже когда контроль заблокирован.
    pub fn jump_edge(&mut self, pressed: bool) -> bool {
        let rising = pressed && !self.jump_held;
        self.jump_held = pressed;
        rising
    }

    /// Горизонтальная скорость для intent'а
    pub fn locomote(&self, direction: Option<Facing>) -> Result<f32, Rejection> {
        if self.is_sliding {
            return Err(Rejection::NoOp);
        }
        Ok(direction.map_or(0.0, |facing| facing.sign() * self.speed))
    }

    /// Вертикальная скорость прыжка
    pub fn jump(&mut self, on_ground: bool) -> Result<f32, Rejection> {
        if self.is_sliding {
            return Err(Rejection::NoOp);
        }
        if on_ground {
            return Ok(self.jump_velocity);
        }
        if self.aerial_jumps < self.max_aerial_jumps {
            self.aerial_jumps += 1;
            return Ok(self.jump_velocity);
        }
        Err(Rejection::NoOp)
    }

    /// Начать slide. Возвращает новые half extents hurtbox'а.
    pub fn start_crouch(&mut self, on_ground: bool) -> Result<Vec2, Rejection> {
        if self.is_sliding || !on_ground {
            return Err(Rejection::NoOp);
        }
        self.is_sliding = true;
        Ok(self.crouch_extents)
    }

    /// Закончить slide. Возвращает стоячие half extents.
    pub fn end_crouch(&mut self) -> Result<Vec2, Rejection> {
        if !self.is_sliding {
            return Err(Rejection::NoOp);
        }
        self.is_sliding = false;
        Ok(self.standing_extents)
    }

    /// Gate для primary attack: пока играет throw анимация, OnCooldown
    pub fn check_throw(&self, animation: &AnimationState) -> Result<(), Rejection> {
        if self.is_sliding {
            return Err(Rejection::NoOp);
        }
        if animation.is_playing(&self.throw_animation) {
            return Err(Rejection::OnCooldown);
        }
        Ok(())
    }

    pub fn check_swing(&self) -> Result<(), Rejection> {
        if self.is_sliding {
            return Err(Rejection::NoOp);
        }
        Ok(())
    }

    /// Точка вылета снаряда
    pub fn muzzle(&self, position: Vec2, facing: Facing) -> Vec2 {
        Vec2::new(position.x + self.throw.muzzle_offset * facing.sign(), position.y)
    }
}

/// Смена extents с сохранением позиции ног (y вверх)
fn resize_hurtbox(hurtbox: &mut Hurtbox, kinematics: &mut Kinematics, extents: Vec2) {
    kinematics.position.y += extents.y - hurtbox.half_extents.y;
    hurtbox.half_extents = extents;
}

fn log_rejection(entity: Entity, action: &str, reason: Rejection) {
    crate::logger::log(&format!("Player {:?} {} rejected: {}", entity, action, reason));
}

/// Система: применение intents этого тика к игрокам
pub fn apply_player_intents(
    mut intents: EventReader<IntentEvent>,
    mut players: Query<
        (
            Entity,
            &mut PlayerController,
            &mut Kinematics,
            &mut Facing,
            &mut Hurtbox,
            &mut ProjectilePool,
            &mut MeleeWeapon,
            &GroundContact,
            &CombatState,
            &AnimationState,
            Has<Defeated>,
        ),
        Without<Deactivated>,
    >,
    clock: Res<SimulationClock>,
    mut fired_events: EventWriter<ProjectileFired>,
    mut attack_events: EventWriter<AttackStarted>,
) {
    let mut frames: HashMap<Entity, IntentFrame> = HashMap::new();
    for event in intents.read() {
        frames.entry(event.entity).or_default().push(event.intent);
    }

    for (
        entity,
        mut controller,
        mut kinematics,
        mut facing,
        mut hurtbox,
        mut pool,
        mut weapon,
        ground,
        combat,
        animation,
        defeated,
    ) in players.iter_mut()
    {
        let frame = frames.get(&entity).copied().unwrap_or_default();
        let on_ground = ground.on_ground;

        controller.touch_ground(on_ground);
        let jump_rising = controller.jump_edge(frame.jump);

        // Уже начатый slide всегда может закончиться
        if frame.crouch_end {
            if let Ok(extents) = controller.end_crouch() {
                resize_hurtbox(&mut hurtbox, &mut kinematics, extents);
            }
        }

        if defeated || combat.is_stunned_at(clock.now) {
            continue;
        }

        if frame.crouch_start {
            match controller.start_crouch(on_ground) {
                Ok(extents) => {
                    resize_hurtbox(&mut hurtbox, &mut kinematics, extents);
                    crate::logger::log(&format!("Player {:?} slide started", entity));
                }
                Err(reason) => log_rejection(entity, "crouch", reason),
            }
        }

        let direction = frame.horizontal();
        if let Ok(vx) = controller.locomote(direction) {
            kinematics.velocity.x = vx;
            if let Some(direction) = direction {
                *facing = direction;
            }
        }

        if jump_rising {
            match controller.jump(on_ground) {
                Ok(vy) => kinematics.velocity.y = vy,
                Err(reason) => log_rejection(entity, "jump", reason),
            }
        }

        if frame.attack_primary {
            let fired = controller.check_throw(animation).and_then(|()| {
                pool.fire(
                    entity,
                    controller.muzzle(kinematics.position, *facing),
                    *facing,
                    controller.throw.speed,
                    controller.throw.damage,
                    controller.throw.range,
                )
            });

            match fired {
                Ok(handle) => {
                    let position = controller.muzzle(kinematics.position, *facing);
                    fired_events.write(ProjectileFired {
                        handle,
                        position,
                        direction: *facing,
                    });
                    attack_events.write(AttackStarted {
                        entity,
                        kind: AttackKind::Projectile,
                        animation: controller.throw_animation.clone(),
                    });
                    crate::logger::log(&format!("🗡️ Player {:?} threw projectile (slot {})", entity, handle.slot));
                }
                Err(reason) => log_rejection(entity, "throw", reason),
            }
        }

        if frame.attack_secondary {
            match controller.check_swing().and_then(|()| weapon.swing(clock.now)) {
                Ok(()) => {
                    attack_events.write(AttackStarted {
                        entity,
                        kind: AttackKind::Melee,
                        animation: weapon.animation.clone(),
                    });
                    crate::logger::log(&format!("⚔️ Player {:?} swing", entity));
                }
                Err(reason) => log_rejection(entity, "swing", reason),
            }
        }
    }
}
