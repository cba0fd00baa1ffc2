//! The physics world: handle storage, effects, and the step loop.
//!
//! Bodies and shapes live in generational slot maps, so a destroyed handle
//! is detectably stale rather than dangling. The step loop is single-threaded
//! except for the narrow phase, which snapshots the overlapping pairs and
//! fans manifold generation out through the injected task scheduler; the
//! pre-solve callback runs on the workers, against immutable per-pair data.

use std::sync::Arc;

use crossbeam_channel::Sender;
use glam::Vec2;
use slotmap::SlotMap;
use smallvec::SmallVec;

use super::body::{BodyData, BodyDef, BodyKind};
use super::contact::{ContactPoint, Prim, collide};
use super::shape::{ShapeData, ShapeDef, ShapeGeom};
use super::{Pose, Rot};
use crate::tasks::{RangeTask, TaskScheduler};

slotmap::new_key_type! {
    /// Handle to a native rigid body.
    pub struct BodyKey;
    /// Handle to a native collider shape.
    pub struct ShapeKey;
}

/// Contact filter invoked before the solver commits a contact.
///
/// Receives both shape handles, the contact point, and the contact normal
/// (pointing from the first shape toward the second). Returning `false`
/// drops the contact for the current sub-step only. Called concurrently
/// from worker threads, so it must only compute from its inputs.
pub type PreSolveFn = Arc<dyn Fn(ShapeKey, ShapeKey, Vec2, Vec2) -> bool + Send + Sync>;

/// World construction parameters, including the injected scheduler.
pub struct WorldDef {
    pub gravity: Vec2,
    pub scheduler: Arc<TaskScheduler>,
}

impl WorldDef {
    pub fn new(scheduler: Arc<TaskScheduler>) -> Self {
        Self {
            gravity: Vec2::new(0.0, -10.0),
            scheduler,
        }
    }
}

const SPECULATIVE_MARGIN: f32 = 0.05;
const NARROW_PHASE_MIN_RANGE: u32 = 8;
const SOLVER_ITERATIONS: usize = 8;
const PENETRATION_SLOP: f32 = 0.005;
const BAUMGARTE: f32 = 0.2;

/// Everything the narrow phase needs to know about one overlapping pair.
#[derive(Clone, Copy)]
struct PairSnap {
    shape_a: ShapeKey,
    shape_b: ShapeKey,
    body_a: BodyKey,
    body_b: BodyKey,
    prim_a: Prim,
    prim_b: Prim,
    friction: f32,
    pre_solve: bool,
}

/// A solver-ready contact between two bodies.
struct Contact {
    body_a: BodyKey,
    body_b: BodyKey,
    normal: Vec2,
    friction: f32,
    points: SmallVec<[ContactPoint; 2]>,
}

/// Range task generating manifolds for a slice of candidate pairs.
struct NarrowPhaseTask {
    pairs: Vec<PairSnap>,
    pre_solve: Option<PreSolveFn>,
    results: Sender<Contact>,
}

impl RangeTask for NarrowPhaseTask {
    fn execute_range(&self, start: u32, end: u32, _worker_index: u32) {
        for pair in &self.pairs[start as usize..end as usize] {
            let Some(manifold) = collide(&pair.prim_a, &pair.prim_b) else {
                continue;
            };
            if pair.pre_solve {
                if let Some(callback) = &self.pre_solve {
                    let allow = callback(
                        pair.shape_a,
                        pair.shape_b,
                        manifold.points[0].point,
                        manifold.normal,
                    );
                    if !allow {
                        continue;
                    }
                }
            }
            let _ = self.results.send(Contact {
                body_a: pair.body_a,
                body_b: pair.body_b,
                normal: manifold.normal,
                friction: pair.friction,
                points: manifold.points,
            });
        }
    }
}

/// A 2D rigid-body world stepped at a fixed timestep.
pub struct PhysicsWorld {
    gravity: Vec2,
    scheduler: Arc<TaskScheduler>,
    bodies: SlotMap<BodyKey, BodyData>,
    shapes: SlotMap<ShapeKey, ShapeData>,
    pre_solve: Option<PreSolveFn>,
}

impl PhysicsWorld {
    pub fn new(def: WorldDef) -> Self {
        Self {
            gravity: def.gravity,
            scheduler: def.scheduler,
            bodies: SlotMap::with_key(),
            shapes: SlotMap::with_key(),
            pre_solve: None,
        }
    }

    /// Register the contact filter. Replaces any previous callback.
    pub fn set_pre_solve(
        &mut self,
        callback: impl Fn(ShapeKey, ShapeKey, Vec2, Vec2) -> bool + Send + Sync + 'static,
    ) {
        self.pre_solve = Some(Arc::new(callback));
    }

    // ==================== BODIES & SHAPES ====================

    pub fn create_body(&mut self, def: &BodyDef) -> BodyKey {
        self.bodies.insert(BodyData::from_def(def))
    }

    /// Destroy a body and every shape attached to it. Stale handles are
    /// ignored, so destruction is idempotent.
    pub fn destroy_body(&mut self, key: BodyKey) {
        let Some(body) = self.bodies.remove(key) else {
            return;
        };
        for shape in body.shapes {
            self.shapes.remove(shape);
        }
    }

    pub fn create_shape(&mut self, body: BodyKey, def: &ShapeDef, geom: ShapeGeom) -> ShapeKey {
        assert!(
            self.bodies.contains_key(body),
            "create_shape on an invalid body handle"
        );
        let key = self.shapes.insert(ShapeData {
            body,
            geom,
            friction: def.friction,
            enable_pre_solve: def.enable_pre_solve,
        });
        self.bodies[body].shapes.push(key);
        let mass: f32 = self.bodies[body]
            .shapes
            .iter()
            .filter_map(|shape| self.shapes.get(*shape))
            .map(|shape| shape.geom.area())
            .sum();
        self.bodies[body].set_mass(mass);
        key
    }

    pub fn is_body_valid(&self, key: BodyKey) -> bool {
        self.bodies.contains_key(key)
    }

    pub fn is_shape_valid(&self, key: ShapeKey) -> bool {
        self.shapes.contains_key(key)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    // ==================== ACCESSORS ====================

    pub fn position(&self, key: BodyKey) -> Option<Vec2> {
        self.bodies.get(key).map(|body| body.pos)
    }

    pub fn pose(&self, key: BodyKey) -> Option<Pose> {
        self.bodies.get(key).map(|body| Pose {
            pos: body.pos,
            rot: body.rot,
        })
    }

    pub fn linear_velocity(&self, key: BodyKey) -> Option<Vec2> {
        self.bodies.get(key).map(|body| body.linvel)
    }

    pub fn set_linear_velocity(&mut self, key: BodyKey, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(key) {
            body.linvel = velocity;
        }
    }

    /// Teleport a body. Contacts are re-evaluated on the next step.
    pub fn set_position(&mut self, key: BodyKey, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(key) {
            body.pos = position;
        }
    }

    pub fn body_kind(&self, key: BodyKey) -> Option<BodyKind> {
        self.bodies.get(key).map(|body| body.kind)
    }

    pub fn linear_damping(&self, key: BodyKey) -> Option<f32> {
        self.bodies.get(key).map(|body| body.linear_damping)
    }

    pub fn is_bullet(&self, key: BodyKey) -> Option<bool> {
        self.bodies.get(key).map(|body| body.bullet)
    }

    pub fn is_rotation_locked(&self, key: BodyKey) -> Option<bool> {
        self.bodies.get(key).map(|body| body.rotation_locked)
    }

    pub fn shape_geom(&self, key: ShapeKey) -> Option<ShapeGeom> {
        self.shapes.get(key).map(|shape| shape.geom)
    }

    // ==================== EFFECTS ====================

    /// Accumulate a force at the center of mass; cleared after the next
    /// step. No-op on non-dynamic bodies and stale handles.
    pub fn apply_force_to_center(&mut self, key: BodyKey, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(key) {
            if body.kind == BodyKind::Dynamic {
                body.force += force;
            }
        }
    }

    /// Instantaneous velocity change at the center of mass.
    pub fn apply_impulse_to_center(&mut self, key: BodyKey, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(key) {
            if body.kind == BodyKind::Dynamic {
                body.linvel += impulse * body.inv_mass;
            }
        }
    }

    // ==================== STEPPING ====================

    /// Advance the world by `dt`, split into `substeps` sub-steps.
    ///
    /// Every range task enqueued during the step is finished before this
    /// returns; no parallel work leaks into the caller's next tick.
    pub fn step(&mut self, dt: f32, substeps: u32) {
        self.scheduler.begin_cycle();
        let substeps = substeps.max(1);
        let h = dt / substeps as f32;
        for _ in 0..substeps {
            self.integrate_velocities(h);
            let pairs = self.broad_phase();
            let contacts = self.narrow_phase(pairs);
            self.solve_contacts(&contacts);
            self.integrate_positions(h);
        }
        for body in self.bodies.values_mut() {
            body.force = Vec2::ZERO;
        }
    }

    fn integrate_velocities(&mut self, h: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Dynamic {
                continue;
            }
            body.linvel += (gravity + body.force * body.inv_mass) * h;
            body.linvel *= 1.0 / (1.0 + h * body.linear_damping);
            if body.rotation_locked {
                body.angvel = 0.0;
            }
        }
    }

    fn broad_phase(&self) -> Vec<PairSnap> {
        let shapes: Vec<_> = self
            .shapes
            .iter()
            .filter_map(|(key, data)| {
                let body = self.bodies.get(data.body)?;
                let prim = data.geom.prim(&Pose {
                    pos: body.pos,
                    rot: body.rot,
                });
                let aabb = prim.aabb(SPECULATIVE_MARGIN);
                Some((key, data, body.kind, prim, aabb))
            })
            .collect();

        let mut pairs = Vec::new();
        for i in 0..shapes.len() {
            for j in (i + 1)..shapes.len() {
                let (key_a, data_a, kind_a, prim_a, aabb_a) = &shapes[i];
                let (key_b, data_b, kind_b, prim_b, aabb_b) = &shapes[j];
                if data_a.body == data_b.body {
                    continue;
                }
                if *kind_a != BodyKind::Dynamic && *kind_b != BodyKind::Dynamic {
                    continue;
                }
                if !aabb_a.overlaps(aabb_b) {
                    continue;
                }
                pairs.push(PairSnap {
                    shape_a: *key_a,
                    shape_b: *key_b,
                    body_a: data_a.body,
                    body_b: data_b.body,
                    prim_a: *prim_a,
                    prim_b: *prim_b,
                    friction: (data_a.friction * data_b.friction).sqrt(),
                    pre_solve: data_a.enable_pre_solve || data_b.enable_pre_solve,
                });
            }
        }
        pairs
    }

    fn narrow_phase(&self, pairs: Vec<PairSnap>) -> Vec<Contact> {
        if pairs.is_empty() {
            return Vec::new();
        }
        let item_count = pairs.len() as u32;
        let (results, collected) = crossbeam_channel::unbounded();
        let task: Arc<dyn RangeTask> = Arc::new(NarrowPhaseTask {
            pairs,
            pre_solve: self.pre_solve.clone(),
            results,
        });
        let handle = self
            .scheduler
            .enqueue(task, item_count, NARROW_PHASE_MIN_RANGE);
        self.scheduler.finish(handle);
        collected.try_iter().collect()
    }

    fn solve_contacts(&mut self, contacts: &[Contact]) {
        if contacts.is_empty() {
            return;
        }

        for _ in 0..SOLVER_ITERATIONS {
            for contact in contacts {
                let normal = contact.normal;
                let tangent = normal.perp();
                for _point in &contact.points {
                    let Some((va, inv_a)) = self.velocity_and_inv_mass(contact.body_a) else {
                        continue;
                    };
                    let Some((vb, inv_b)) = self.velocity_and_inv_mass(contact.body_b) else {
                        continue;
                    };
                    let inv_sum = inv_a + inv_b;
                    if inv_sum == 0.0 {
                        continue;
                    }
                    let vn = (vb - va).dot(normal);
                    if vn >= 0.0 {
                        continue;
                    }
                    let lambda = -vn / inv_sum;
                    self.nudge(contact.body_a, -lambda * inv_a * normal);
                    self.nudge(contact.body_b, lambda * inv_b * normal);

                    // Coulomb friction clamped by the normal impulse.
                    let Some((va, _)) = self.velocity_and_inv_mass(contact.body_a) else {
                        continue;
                    };
                    let Some((vb, _)) = self.velocity_and_inv_mass(contact.body_b) else {
                        continue;
                    };
                    let vt = (vb - va).dot(tangent);
                    let max_friction = contact.friction * lambda;
                    let jt = (-vt / inv_sum).clamp(-max_friction, max_friction);
                    self.nudge(contact.body_a, -jt * inv_a * tangent);
                    self.nudge(contact.body_b, jt * inv_b * tangent);
                }
            }
        }

        // Positional projection resolves the remaining overlap.
        for contact in contacts {
            for point in &contact.points {
                let Some((_, inv_a)) = self.velocity_and_inv_mass(contact.body_a) else {
                    continue;
                };
                let Some((_, inv_b)) = self.velocity_and_inv_mass(contact.body_b) else {
                    continue;
                };
                let inv_sum = inv_a + inv_b;
                if inv_sum == 0.0 {
                    continue;
                }
                let push =
                    BAUMGARTE * (point.penetration - PENETRATION_SLOP).max(0.0) / inv_sum;
                self.shove(contact.body_a, -push * inv_a * contact.normal);
                self.shove(contact.body_b, push * inv_b * contact.normal);
            }
        }
    }

    fn velocity_and_inv_mass(&self, key: BodyKey) -> Option<(Vec2, f32)> {
        self.bodies.get(key).map(|body| (body.linvel, body.inv_mass))
    }

    fn nudge(&mut self, key: BodyKey, dv: Vec2) {
        if let Some(body) = self.bodies.get_mut(key) {
            body.linvel += dv;
        }
    }

    fn shove(&mut self, key: BodyKey, dp: Vec2) {
        if let Some(body) = self.bodies.get_mut(key) {
            body.pos += dp;
        }
    }

    fn integrate_positions(&mut self, h: f32) {
        for body in self.bodies.values_mut() {
            if body.kind == BodyKind::Static {
                continue;
            }
            body.pos += body.linvel * h;
            if !body.rotation_locked && body.angvel != 0.0 {
                body.angle += body.angvel * h;
                body.rot = Rot::from_angle(body.angle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;
    use std::sync::Mutex;

    const TIME_STEP: f32 = 1.0 / 60.0;
    const SUB_STEPS: u32 = 4;

    fn make_world(gravity: Vec2) -> PhysicsWorld {
        PhysicsWorld::new(WorldDef {
            gravity,
            scheduler: Arc::new(TaskScheduler::new(2)),
        })
    }

    fn spawn_ground(world: &mut PhysicsWorld) -> (BodyKey, ShapeKey) {
        let body = world.create_body(&BodyDef {
            kind: BodyKind::Static,
            ..Default::default()
        });
        let shape = world.create_shape(
            body,
            &ShapeDef {
                enable_pre_solve: true,
                ..Default::default()
            },
            ShapeGeom::Segment {
                p1: vec2(-20.0, 0.0),
                p2: vec2(20.0, 0.0),
            },
        );
        (body, shape)
    }

    fn spawn_capsule(world: &mut PhysicsWorld, position: Vec2) -> (BodyKey, ShapeKey) {
        let body = world.create_body(&BodyDef {
            position,
            ..Default::default()
        });
        let shape = world.create_shape(
            body,
            &ShapeDef {
                enable_pre_solve: true,
                ..Default::default()
            },
            ShapeGeom::Capsule {
                half_height: 0.8,
                radius: 0.5,
            },
        );
        (body, shape)
    }

    // ==================== DEFINITION FIDELITY ====================

    #[test]
    fn body_matches_its_definition() {
        let mut world = make_world(Vec2::ZERO);
        let body = world.create_body(&BodyDef {
            kind: BodyKind::Kinematic,
            position: vec2(1.0, 2.0),
            linear_velocity: vec2(2.0, 0.0),
            linear_damping: 0.5,
            bullet: true,
            rotation_locked: false,
        });
        assert_eq!(world.body_kind(body), Some(BodyKind::Kinematic));
        assert_eq!(world.position(body), Some(vec2(1.0, 2.0)));
        assert_eq!(world.linear_velocity(body), Some(vec2(2.0, 0.0)));
        assert_eq!(world.linear_damping(body), Some(0.5));
        assert_eq!(world.is_bullet(body), Some(true));
        assert_eq!(world.is_rotation_locked(body), Some(false));
    }

    #[test]
    fn destroy_invalidates_body_and_shape_handles() {
        let mut world = make_world(Vec2::ZERO);
        let (body, shape) = spawn_capsule(&mut world, Vec2::ZERO);
        assert!(world.is_body_valid(body));
        assert!(world.is_shape_valid(shape));

        world.destroy_body(body);
        assert!(!world.is_body_valid(body));
        assert!(!world.is_shape_valid(shape));
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.shape_count(), 0);

        // Destroying a stale handle is a no-op.
        world.destroy_body(body);
        assert_eq!(world.body_count(), 0);
    }

    // ==================== INTEGRATION ====================

    #[test]
    fn held_force_produces_monotonic_displacement() {
        let mut world = make_world(Vec2::ZERO);
        let (body, _) = spawn_capsule(&mut world, Vec2::ZERO);

        let mut last_x = 0.0;
        for _ in 0..60 {
            world.apply_force_to_center(body, vec2(25.0, 0.0));
            world.step(TIME_STEP, SUB_STEPS);
            let x = world.position(body).unwrap().x;
            assert!(x > last_x);
            last_x = x;
        }
    }

    #[test]
    fn impulse_changes_velocity_immediately() {
        let mut world = make_world(Vec2::ZERO);
        let body = world.create_body(&BodyDef::default());
        // Shapeless dynamic bodies weigh one unit.
        world.apply_impulse_to_center(body, vec2(0.0, 25.0));
        let velocity = world.linear_velocity(body).unwrap();
        assert!((velocity.y - 25.0).abs() < 1e-5);
    }

    #[test]
    fn damping_decays_velocity() {
        let mut world = make_world(Vec2::ZERO);
        let body = world.create_body(&BodyDef {
            linear_velocity: vec2(10.0, 0.0),
            linear_damping: 2.0,
            ..Default::default()
        });
        world.step(TIME_STEP, SUB_STEPS);
        let damped = world.linear_velocity(body).unwrap().x;
        assert!(damped < 10.0);
        assert!(damped > 0.0);
    }

    #[test]
    fn forces_do_not_move_static_or_kinematic_bodies() {
        let mut world = make_world(Vec2::ZERO);
        let anchor = world.create_body(&BodyDef {
            kind: BodyKind::Static,
            ..Default::default()
        });
        let platform = world.create_body(&BodyDef {
            kind: BodyKind::Kinematic,
            ..Default::default()
        });
        world.apply_force_to_center(anchor, vec2(100.0, 0.0));
        world.apply_impulse_to_center(platform, vec2(100.0, 0.0));
        world.step(TIME_STEP, SUB_STEPS);
        assert_eq!(world.position(anchor), Some(Vec2::ZERO));
        assert_eq!(world.linear_velocity(platform), Some(Vec2::ZERO));
    }

    #[test]
    fn kinematic_body_moves_by_its_velocity_ignoring_gravity() {
        let mut world = make_world(vec2(0.0, -10.0));
        let platform = world.create_body(&BodyDef {
            kind: BodyKind::Kinematic,
            linear_velocity: vec2(2.0, 0.0),
            ..Default::default()
        });
        for _ in 0..60 {
            world.step(TIME_STEP, SUB_STEPS);
        }
        let position = world.position(platform).unwrap();
        assert!((position.x - 2.0).abs() < 1e-3);
        assert!(position.y.abs() < 1e-6);
    }

    // ==================== CONTACTS ====================

    #[test]
    fn falling_capsule_comes_to_rest_on_the_ground() {
        let mut world = make_world(vec2(0.0, -10.0));
        spawn_ground(&mut world);
        let (body, _) = spawn_capsule(&mut world, vec2(0.0, 2.0));

        for _ in 0..300 {
            world.step(TIME_STEP, SUB_STEPS);
        }
        let position = world.position(body).unwrap();
        let velocity = world.linear_velocity(body).unwrap();
        // Resting height: half height + radius above the floor line.
        assert!(position.y > 1.0 && position.y < 1.5);
        assert!(velocity.y.abs() < 0.5);
    }

    #[test]
    fn pre_solve_veto_disables_contacts() {
        let mut world = make_world(vec2(0.0, -10.0));
        spawn_ground(&mut world);
        let (body, _) = spawn_capsule(&mut world, vec2(0.0, 2.0));
        world.set_pre_solve(|_, _, _, _| false);

        for _ in 0..300 {
            world.step(TIME_STEP, SUB_STEPS);
        }
        // With every contact vetoed the capsule falls through the floor.
        assert!(world.position(body).unwrap().y < 0.0);
    }

    #[test]
    fn pre_solve_receives_the_contact_pair() {
        let mut world = make_world(vec2(0.0, -10.0));
        let (_, ground_shape) = spawn_ground(&mut world);
        let (_, capsule_shape) = spawn_capsule(&mut world, vec2(0.0, 1.4));

        let seen: Arc<Mutex<Vec<(ShapeKey, ShapeKey)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        world.set_pre_solve(move |a, b, _point, _normal| {
            sink.lock().unwrap().push((a, b));
            true
        });

        for _ in 0..30 {
            world.step(TIME_STEP, SUB_STEPS);
        }
        let seen = seen.lock().unwrap();
        assert!(
            seen.iter().any(|(a, b)| {
                (*a == ground_shape && *b == capsule_shape)
                    || (*a == capsule_shape && *b == ground_shape)
            }),
            "pre-solve never saw the ground/capsule pair"
        );
    }
}
