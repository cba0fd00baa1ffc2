//! Behavior script systems.
//!
//! Scripts run before the simulation tick each frame: they reset the
//! entity's [`Output`], drive the state machine against a fresh context,
//! and write the results back. The required component set is the query
//! itself; an entity missing any of it never reaches the script.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::input::Input;
use crate::components::output::Output;
use crate::components::transform::Transform;
use crate::scripts::player::{Idle, JUMP_IMPULSE, PlayerContext, PlayerScript};

/// Initialize freshly added player scripts in the [`Idle`] state.
pub fn init_player_scripts(
    mut query: Query<
        (&mut PlayerScript, &Input, &mut Output, &mut Transform),
        Added<PlayerScript>,
    >,
) {
    for (mut script, input, mut output, mut transform) in query.iter_mut() {
        let mut ctx = PlayerContext {
            input: *input,
            output: *output,
            flip: transform.flip,
        };
        script.machine.init::<Idle>(&mut ctx);
        *output = ctx.output;
        transform.set_flip(ctx.flip);
    }
}

/// Drive every player script for one tick.
///
/// The output accumulators are reset before the machine runs, so a script
/// only ever applies what it wrote this tick.
pub fn update_player_scripts(
    mut query: Query<(&mut PlayerScript, &Input, &mut Output, &mut Transform)>,
) {
    for (mut script, input, mut output, mut transform) in query.iter_mut() {
        output.reset();
        let mut ctx = PlayerContext {
            input: *input,
            output: *output,
            flip: transform.flip,
        };
        script.machine.update(&mut ctx);
        // jump
        if ctx.input.up {
            ctx.output.impulse = Vec2::new(0.0, JUMP_IMPULSE);
        }
        *output = ctx.output;
        transform.set_flip(ctx.flip);
    }
}
