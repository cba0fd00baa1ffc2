//! The fixed per-tick simulation pipeline.
//!
//! Passes run in a strict order: `create_bodies → destroy_bodies →
//! apply_effects → step_world → sync_transforms`. New entities get their
//! physics representation before forces are applied the same tick, doomed
//! entities never receive forces or a post-step sync, and transforms always
//! reflect the latest step.
//!
//! Each pass is a free function over `(&mut Simulation, &mut World)` so
//! tests can drive them individually; [`simulation_tick`] is the exclusive
//! system that runs the whole pipeline.

use bevy_ecs::prelude::*;

use crate::components::body::Body;
use crate::components::bodydesc::{BoxDesc, CapsuleDesc, MovementDesc};
use crate::components::output::Output;
use crate::components::tags::{DespawnPhysics, SpawnPhysics};
use crate::components::transform::Transform;
use crate::error::SimError;
use crate::physics::{BodyDef, ShapeDef, ShapeGeom};
use crate::resources::simulation::Simulation;

enum PendingShape {
    Capsule(CapsuleDesc),
    Box(BoxDesc),
}

/// Create native bodies for every entity tagged with [`SpawnPhysics`].
///
/// All descriptors are validated before the first native allocation, so a
/// configuration error aborts the pass without leaving a half-created body.
pub fn create_bodies(sim: &mut Simulation, world: &mut World) -> Result<(), SimError> {
    let mut query = world.query_filtered::<(
        Entity,
        &Transform,
        Option<&MovementDesc>,
        Option<&CapsuleDesc>,
        Option<&BoxDesc>,
    ), With<SpawnPhysics>>();

    let mut pending = Vec::new();
    for (entity, transform, movement, capsule, box_desc) in query.iter(world) {
        let movement = movement
            .copied()
            .ok_or(SimError::MissingMovementDesc(entity))?;
        let shape = match (capsule, box_desc) {
            (Some(capsule), None) => PendingShape::Capsule(*capsule),
            (None, Some(box_desc)) => PendingShape::Box(*box_desc),
            (Some(capsule), Some(_)) => {
                log::warn!(
                    "entity {entity:?} carries both capsule and box shape descriptors, using the capsule"
                );
                PendingShape::Capsule(*capsule)
            }
            (None, None) => return Err(SimError::MissingShapeDesc(entity)),
        };
        pending.push((entity, *transform, movement, shape));
    }

    for (entity, transform, movement, shape) in pending {
        let body = sim.physics_mut().create_body(&BodyDef {
            kind: movement.kind,
            position: transform.pos,
            linear_damping: movement.linear_damping,
            bullet: movement.bullet,
            rotation_locked: movement.rotation_locked,
            ..Default::default()
        });
        let (shape_def, geom) = match shape {
            PendingShape::Capsule(desc) => (
                ShapeDef {
                    friction: desc.material.friction,
                    enable_pre_solve: true,
                },
                ShapeGeom::Capsule {
                    half_height: desc.half_height,
                    radius: desc.radius,
                },
            ),
            PendingShape::Box(desc) => (
                ShapeDef {
                    friction: desc.material.friction,
                    enable_pre_solve: true,
                },
                ShapeGeom::Box {
                    half_width: desc.half_width,
                    half_height: desc.half_height,
                },
            ),
        };
        let shape = sim.physics_mut().create_shape(body, &shape_def, geom);
        sim.track(entity, body, shape);
        world
            .entity_mut(entity)
            .insert(Body { body, shape })
            .remove::<SpawnPhysics>();
        log::debug!("created physics body for entity {entity:?}");
    }
    Ok(())
}

/// Release native bodies of entities tagged with [`DespawnPhysics`].
///
/// A no-op when nothing is tagged; running it twice changes nothing.
pub fn destroy_bodies(sim: &mut Simulation, world: &mut World) {
    let mut query = world.query_filtered::<(Entity, &Body), With<DespawnPhysics>>();
    let doomed: Vec<(Entity, Body)> = query
        .iter(world)
        .map(|(entity, body)| (entity, *body))
        .collect();

    for (entity, body) in doomed {
        sim.physics_mut().destroy_body(body.body);
        sim.untrack(body.body, body.shape);
        world
            .entity_mut(entity)
            .remove::<(Body, DespawnPhysics)>();
        log::debug!("destroyed physics body of entity {entity:?}");
    }
}

/// Apply accumulated script output to the native bodies.
///
/// `Output` is not cleared here; the owning script resets it at the start
/// of its next update.
pub fn apply_effects(sim: &mut Simulation, world: &mut World) {
    let mut query = world.query::<(&Body, &Output)>();
    for (body, output) in query.iter(world) {
        sim.physics_mut().apply_force_to_center(body.body, output.force);
        sim.physics_mut()
            .apply_impulse_to_center(body.body, output.impulse);
    }
}

/// Copy post-step poses back into entity transforms, preserving the flip.
pub fn sync_transforms(sim: &Simulation, world: &mut World) {
    let mut query = world.query::<(&Body, &mut Transform)>();
    for (body, mut transform) in query.iter_mut(world) {
        if let Some(pose) = sim.physics().pose(body.body) {
            transform.set_pose(pose);
        }
    }
}

/// Run one full simulation tick over the world.
pub fn run_tick(sim: &mut Simulation, world: &mut World) -> Result<(), SimError> {
    create_bodies(sim, world)?;
    destroy_bodies(sim, world);
    apply_effects(sim, world);
    sim.step_world();
    sync_transforms(sim, world);
    Ok(())
}

/// Exclusive system wrapping [`run_tick`].
///
/// Configuration errors are developer-facing and unrecoverable, so they
/// abort here rather than being swallowed.
pub fn simulation_tick(world: &mut World) {
    world.resource_scope(|world, mut sim: Mut<Simulation>| {
        if let Err(error) = run_tick(&mut sim, world) {
            panic!("simulation tick failed: {error}");
        }
    });
}
