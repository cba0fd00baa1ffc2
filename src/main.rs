//! Ledgecore headless demo.
//!
//! Runs a few seconds of simulation with scripted input: the player runs
//! right, stops, and jumps once, while the kinematic platform patrols and a
//! crate settles on the ground before being despawned again. Positions are
//! logged once per simulated second.
//!
//! # Running
//!
//! ```sh
//! cargo run --release
//! ```

use glam::vec2;

use ledgecore::components::input::Input;
use ledgecore::components::tags::DespawnPhysics;
use ledgecore::components::transform::Transform;
use ledgecore::game::{build_world, spawn_crate, spawn_player};
use ledgecore::resources::simulation::Simulation;

const TICKS: u32 = 600;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (mut world, mut schedule) = build_world();
    let player = spawn_player(&mut world, vec2(0.0, 2.0));
    let loose_crate = spawn_crate(&mut world, vec2(3.0, 4.0), 0.5);

    let workers = world.resource::<Simulation>().worker_count();
    log::info!("running {TICKS} ticks of headless simulation on {workers} workers");

    for tick in 0..TICKS {
        {
            let mut input = world
                .get_mut::<Input>(player)
                .expect("player lost its input component");
            input.right = tick < 240;
            input.up = tick == 300;
        }
        if tick == 420 {
            world.entity_mut(loose_crate).insert(DespawnPhysics);
            log::info!("tick {tick}: despawning the crate's physics body");
        }
        schedule.run(&mut world);

        if tick % 60 == 0 {
            let transform = world
                .get::<Transform>(player)
                .expect("player lost its transform");
            log::info!(
                "tick {tick:3}: player at ({:6.2}, {:5.2}) facing {}",
                transform.pos.x,
                transform.pos.y,
                if transform.flip >= 0.0 { "right" } else { "left" }
            );
        }
    }
}
