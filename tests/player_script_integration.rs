//! Integration tests for behavior scripts driving the simulation.

use bevy_ecs::prelude::*;
use glam::{Vec2, vec2};

use ledgecore::components::input::Input;
use ledgecore::components::output::Output;
use ledgecore::components::transform::Transform;
use ledgecore::game::{build_world, spawn_player};
use ledgecore::scripts::player::{JUMP_IMPULSE, MOVE_FORCE};
use ledgecore::systems::script::{init_player_scripts, update_player_scripts};

const EPSILON: f32 = 1e-6;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// World and schedule running only the script systems, no physics.
fn make_script_world() -> (World, Schedule) {
    let world = World::new();
    let mut schedule = Schedule::default();
    schedule.add_systems((init_player_scripts, update_player_scripts).chain());
    (world, schedule)
}

fn spawn_scripted_entity(world: &mut World, input: Input) -> Entity {
    world
        .spawn((
            Transform::from_position(0.0, 0.0),
            input,
            Output::default(),
            ledgecore::scripts::player::PlayerScript::default(),
        ))
        .id()
}

// ==================== SCRIPT-ONLY TICKS ====================

#[test]
fn idle_player_writes_no_output() {
    let (mut world, mut schedule) = make_script_world();
    let entity = spawn_scripted_entity(&mut world, Input::default());

    schedule.run(&mut world);
    schedule.run(&mut world);

    let output = world.get::<Output>(entity).unwrap();
    assert_eq!(*output, Output::default());
}

#[test]
fn holding_right_drives_a_rightward_force() {
    let (mut world, mut schedule) = make_script_world();
    let entity = spawn_scripted_entity(
        &mut world,
        Input {
            right: true,
            ..Default::default()
        },
    );

    // First tick transitions Idle -> Moving; the second writes the force.
    schedule.run(&mut world);
    schedule.run(&mut world);

    let output = world.get::<Output>(entity).unwrap();
    assert!(approx_eq(output.force.x, MOVE_FORCE));
    assert!(approx_eq(output.force.y, 0.0));
    assert!(approx_eq(world.get::<Transform>(entity).unwrap().flip, 1.0));
}

#[test]
fn holding_left_flips_the_facing() {
    let (mut world, mut schedule) = make_script_world();
    let entity = spawn_scripted_entity(
        &mut world,
        Input {
            left: true,
            ..Default::default()
        },
    );

    schedule.run(&mut world);
    schedule.run(&mut world);

    let output = world.get::<Output>(entity).unwrap();
    assert!(approx_eq(output.force.x, -MOVE_FORCE));
    assert!(approx_eq(world.get::<Transform>(entity).unwrap().flip, -1.0));
}

#[test]
fn releasing_input_clears_the_force_next_tick() {
    let (mut world, mut schedule) = make_script_world();
    let entity = spawn_scripted_entity(
        &mut world,
        Input {
            right: true,
            ..Default::default()
        },
    );

    schedule.run(&mut world);
    schedule.run(&mut world);
    assert!(approx_eq(
        world.get::<Output>(entity).unwrap().force.x,
        MOVE_FORCE
    ));

    world.get_mut::<Input>(entity).unwrap().right = false;
    schedule.run(&mut world);

    // Moving saw no input, wrote nothing, and handed back to Idle.
    assert_eq!(*world.get::<Output>(entity).unwrap(), Output::default());
}

#[test]
fn jump_writes_an_upward_impulse() {
    let (mut world, mut schedule) = make_script_world();
    let entity = spawn_scripted_entity(
        &mut world,
        Input {
            up: true,
            ..Default::default()
        },
    );

    schedule.run(&mut world);

    let output = world.get::<Output>(entity).unwrap();
    assert_eq!(output.impulse, Vec2::new(0.0, JUMP_IMPULSE));
}

#[test]
fn facing_survives_after_input_releases() {
    let (mut world, mut schedule) = make_script_world();
    let entity = spawn_scripted_entity(
        &mut world,
        Input {
            left: true,
            ..Default::default()
        },
    );

    schedule.run(&mut world);
    schedule.run(&mut world);
    world.get_mut::<Input>(entity).unwrap().left = false;
    schedule.run(&mut world);

    // The sprite keeps facing the way it last moved.
    assert!(approx_eq(world.get::<Transform>(entity).unwrap().flip, -1.0));
}

// ==================== END TO END ====================

#[test]
fn scripted_run_moves_the_player_through_physics() {
    let (mut world, mut schedule) = build_world();
    let player = spawn_player(&mut world, vec2(0.0, 2.0));

    world.get_mut::<Input>(player).unwrap().right = true;
    for _ in 0..120 {
        schedule.run(&mut world);
    }

    let transform = world.get::<Transform>(player).unwrap();
    assert!(
        transform.pos.x > 1.0,
        "two seconds of running should cover ground, got x = {}",
        transform.pos.x
    );
    assert!(approx_eq(transform.flip, 1.0));
}

#[test]
fn player_settles_on_the_ground_when_idle() {
    let (mut world, mut schedule) = build_world();
    let player = spawn_player(&mut world, vec2(0.0, 2.0));

    for _ in 0..300 {
        schedule.run(&mut world);
    }

    let transform = world.get::<Transform>(player).unwrap();
    assert!(transform.pos.y > 1.0 && transform.pos.y < 1.5);
    assert!(transform.pos.x.abs() < 0.5);
}
