//! World and schedule construction plus entity spawn helpers.
//!
//! The schedule runs scripts first, then the simulation pipeline: scripts
//! write force/impulse requests and the pipeline consumes them in the same
//! tick.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::bodydesc::{BoxDesc, CapsuleDesc, MovementDesc};
use crate::components::input::Input;
use crate::components::output::Output;
use crate::components::tags::SpawnPhysics;
use crate::components::transform::Transform;
use crate::resources::simulation::Simulation;
use crate::scripts::player::PlayerScript;
use crate::systems::script::{init_player_scripts, update_player_scripts};
use crate::systems::simulation::simulation_tick;

/// Worker threads backing the physics world's parallel solve.
pub const WORKER_COUNT: usize = 4;

/// Build an ECS world with its simulation resource and the per-tick
/// schedule.
pub fn build_world() -> (World, Schedule) {
    let mut world = World::new();
    world.insert_resource(Simulation::new(WORKER_COUNT));

    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            init_player_scripts,
            update_player_scripts,
            simulation_tick,
        )
            .chain(),
    );
    (world, schedule)
}

/// Spawn the player: a dynamic capsule driven by its behavior script.
pub fn spawn_player(world: &mut World, position: Vec2) -> Entity {
    world
        .spawn((
            Transform::from_position(position.x, position.y),
            SpawnPhysics,
            MovementDesc {
                linear_damping: 0.5,
                ..Default::default()
            },
            CapsuleDesc::new(0.8, 0.5).with_friction(0.1),
            Input::default(),
            Output::default(),
            PlayerScript::default(),
        ))
        .id()
}

/// Spawn a loose dynamic crate.
pub fn spawn_crate(world: &mut World, position: Vec2, half_extent: f32) -> Entity {
    world
        .spawn((
            Transform::from_position(position.x, position.y),
            SpawnPhysics,
            MovementDesc::default(),
            BoxDesc::new(half_extent, half_extent).with_friction(0.4),
            Output::default(),
        ))
        .id()
}
