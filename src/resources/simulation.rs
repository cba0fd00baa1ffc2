//! The simulation resource: physics world, scheduler, and side tables.
//!
//! One [`Simulation`] per ECS world. It owns the native physics world, the
//! worker-pool scheduler injected into it, and the side tables mapping
//! native handles back to the entities that own them. The per-tick pipeline
//! lives in [`crate::systems::simulation`]; this module holds the state and
//! the fixed-timestep stepping itself.

use std::sync::Arc;

use bevy_ecs::prelude::{Entity, Resource};
use glam::{Vec2, vec2};
use rustc_hash::FxHashMap;

use crate::physics::{
    BodyDef, BodyKey, BodyKind, PhysicsWorld, ShapeDef, ShapeGeom, ShapeKey, WorldDef,
};
use crate::tasks::TaskScheduler;

/// Fixed physics timestep. Wall-clock pacing is the caller's concern.
pub const TIME_STEP: f32 = 1.0 / 60.0;
/// Sub-steps per physics step.
pub const SUB_STEPS: u32 = 4;

/// Moving-platform patrol bounds and speed.
const PLATFORM_LIMIT: f32 = 15.0;
const PLATFORM_SPEED: f32 = 2.0;

/// Owns the native physics world and drives it at a fixed timestep.
#[derive(Resource)]
pub struct Simulation {
    world: PhysicsWorld,
    scheduler: Arc<TaskScheduler>,
    body_owners: FxHashMap<BodyKey, Entity>,
    shape_owners: FxHashMap<ShapeKey, Entity>,
    moving_platform: BodyKey,
}

impl Simulation {
    /// Create the simulation with its worker pool and bootstrap the arena:
    /// a ground line, a static platform, and a kinematic moving platform.
    pub fn new(worker_count: usize) -> Self {
        let scheduler = Arc::new(TaskScheduler::new(worker_count));
        let mut world = PhysicsWorld::new(WorldDef::new(Arc::clone(&scheduler)));
        // Permissive default; gameplay contact filtering replaces this.
        world.set_pre_solve(|_, _, _, _| true);
        let moving_platform = build_arena(&mut world);
        Self {
            world,
            scheduler,
            body_owners: FxHashMap::default(),
            shape_owners: FxHashMap::default(),
            moving_platform,
        }
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn worker_count(&self) -> usize {
        self.scheduler.worker_count()
    }

    pub fn moving_platform(&self) -> BodyKey {
        self.moving_platform
    }

    /// Replace the contact filter invoked during the parallel solve.
    pub fn set_pre_solve(
        &mut self,
        callback: impl Fn(ShapeKey, ShapeKey, Vec2, Vec2) -> bool + Send + Sync + 'static,
    ) {
        self.world.set_pre_solve(callback);
    }

    // ==================== HANDLE SIDE TABLES ====================

    /// Record which entity owns a freshly created body and shape.
    pub fn track(&mut self, entity: Entity, body: BodyKey, shape: ShapeKey) {
        self.body_owners.insert(body, entity);
        self.shape_owners.insert(shape, entity);
    }

    /// Drop the side-table entries of a destroyed body.
    pub fn untrack(&mut self, body: BodyKey, shape: ShapeKey) {
        self.body_owners.remove(&body);
        self.shape_owners.remove(&shape);
    }

    pub fn entity_for_body(&self, body: BodyKey) -> Option<Entity> {
        self.body_owners.get(&body).copied()
    }

    pub fn entity_for_shape(&self, shape: ShapeKey) -> Option<Entity> {
        self.shape_owners.get(&shape).copied()
    }

    // ==================== STEPPING ====================

    /// Advance the physics world by one fixed step.
    ///
    /// The kinematic platform is steered by velocity rather than teleported
    /// so friction keeps carrying whatever stands on it.
    pub fn step_world(&mut self) {
        if let Some(position) = self.world.position(self.moving_platform) {
            if position.x < -PLATFORM_LIMIT {
                self.world
                    .set_linear_velocity(self.moving_platform, vec2(PLATFORM_SPEED, 0.0));
            } else if position.x > PLATFORM_LIMIT {
                self.world
                    .set_linear_velocity(self.moving_platform, vec2(-PLATFORM_SPEED, 0.0));
            }
        }
        self.world.step(TIME_STEP, SUB_STEPS);
    }
}

fn build_arena(world: &mut PhysicsWorld) -> BodyKey {
    // Ground line.
    let ground = world.create_body(&BodyDef {
        kind: BodyKind::Static,
        ..Default::default()
    });
    world.create_shape(
        ground,
        &ShapeDef {
            enable_pre_solve: true,
            ..Default::default()
        },
        ShapeGeom::Segment {
            p1: vec2(-20.0, 0.0),
            p2: vec2(20.0, 0.0),
        },
    );

    // Static platform.
    let platform = world.create_body(&BodyDef {
        kind: BodyKind::Static,
        position: vec2(-6.0, 6.0),
        ..Default::default()
    });
    world.create_shape(
        platform,
        &ShapeDef {
            enable_pre_solve: true,
            ..Default::default()
        },
        ShapeGeom::Box {
            half_width: 2.0,
            half_height: 0.5,
        },
    );

    // Moving platform, steered by the threshold rule in `step_world`.
    let mover = world.create_body(&BodyDef {
        kind: BodyKind::Kinematic,
        position: vec2(0.0, 6.0),
        linear_velocity: vec2(PLATFORM_SPEED, 0.0),
        ..Default::default()
    });
    world.create_shape(
        mover,
        &ShapeDef {
            enable_pre_solve: true,
            ..Default::default()
        },
        ShapeGeom::Box {
            half_width: 3.0,
            half_height: 0.5,
        },
    );
    mover
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_bootstraps_three_bodies() {
        let sim = Simulation::new(2);
        assert_eq!(sim.physics().body_count(), 3);
        assert_eq!(sim.physics().shape_count(), 3);
        assert_eq!(
            sim.physics().body_kind(sim.moving_platform()),
            Some(BodyKind::Kinematic)
        );
    }

    #[test]
    fn platform_beyond_left_limit_is_sent_right() {
        let mut sim = Simulation::new(2);
        let platform = sim.moving_platform();
        sim.physics_mut().set_position(platform, vec2(-16.0, 6.0));
        sim.step_world();
        assert_eq!(
            sim.physics().linear_velocity(platform),
            Some(vec2(PLATFORM_SPEED, 0.0))
        );
    }

    #[test]
    fn platform_beyond_right_limit_is_sent_left() {
        let mut sim = Simulation::new(2);
        let platform = sim.moving_platform();
        sim.physics_mut().set_position(platform, vec2(16.0, 6.0));
        sim.step_world();
        assert_eq!(
            sim.physics().linear_velocity(platform),
            Some(vec2(-PLATFORM_SPEED, 0.0))
        );
    }

    #[test]
    fn platform_between_limits_keeps_its_velocity() {
        let mut sim = Simulation::new(2);
        let platform = sim.moving_platform();
        sim.physics_mut()
            .set_linear_velocity(platform, vec2(-PLATFORM_SPEED, 0.0));
        sim.step_world();
        assert_eq!(
            sim.physics().linear_velocity(platform),
            Some(vec2(-PLATFORM_SPEED, 0.0))
        );
    }
}
