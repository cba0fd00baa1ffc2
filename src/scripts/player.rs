//! Player behavior script.
//!
//! Reads the entity's [`Input`], drives a small state machine, and writes
//! movement forces and the jump impulse into [`Output`]. Facing is written
//! through the transform flip so the sprite mirrors with movement.

use bevy_ecs::prelude::Component;
use glam::Vec2;

use crate::components::input::Input;
use crate::components::output::Output;

use super::machine::{State, StateMachine};

/// Continuous horizontal drive while moving.
pub const MOVE_FORCE: f32 = 25.0;
/// Instantaneous upward impulse on jump.
pub const JUMP_IMPULSE: f32 = 25.0;
/// Reserved for the attack move.
pub const ATTACK_FORCE: f32 = 10.0;

/// Per-tick context the player states operate on.
///
/// Rebuilt from the entity's components at the start of every script update
/// and written back afterwards.
pub struct PlayerContext {
    pub input: Input,
    pub output: Output,
    pub flip: f32,
}

/// State-machine-driven player behavior, one instance per entity.
#[derive(Component, Default)]
pub struct PlayerScript {
    pub machine: StateMachine<PlayerContext>,
}

/// Standing still, waiting for directional input.
#[derive(Default)]
pub struct Idle;

impl State<PlayerContext> for Idle {
    fn on_update(&mut self, machine: &mut StateMachine<PlayerContext>, ctx: &mut PlayerContext) {
        if ctx.input.left || ctx.input.right {
            machine.switch_state::<Moving>();
        }
    }
}

/// Running left or right; drops back to [`Idle`] when input releases.
#[derive(Default)]
pub struct Moving;

impl State<PlayerContext> for Moving {
    fn on_update(&mut self, machine: &mut StateMachine<PlayerContext>, ctx: &mut PlayerContext) {
        if ctx.input.left {
            ctx.flip = -1.0;
            ctx.output.force = Vec2::new(-MOVE_FORCE, 0.0);
        } else if ctx.input.right {
            ctx.flip = 1.0;
            ctx.output.force = Vec2::new(MOVE_FORCE, 0.0);
        } else {
            machine.switch_state::<Idle>();
        }
    }
}

/// Terminal state; clears any queued movement on entry.
#[derive(Default)]
pub struct Dead;

impl State<PlayerContext> for Dead {
    fn on_enter(&mut self, _machine: &mut StateMachine<PlayerContext>, ctx: &mut PlayerContext) {
        ctx.output.reset();
    }
}
