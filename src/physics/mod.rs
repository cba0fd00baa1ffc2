//! Compact 2D rigid-body engine backing the simulation core.
//!
//! This is the "native" side of the body lifecycle: the simulation layer
//! talks to it exclusively through [`PhysicsWorld`] and the generational
//! [`BodyKey`]/[`ShapeKey`] handles, never through the internal body
//! storage. Stepping is fixed-timestep with sub-steps; the narrow phase
//! fans out across the worker pool in [`crate::tasks`] and every contact
//! passes the registered pre-solve callback before the solver sees it.
//!
//! Submodules:
//! - [`body`] – body definitions and internal body state
//! - [`shape`] – shape definitions and collider geometry
//! - [`contact`] – collision primitives and manifold generation
//! - [`world`] – the world itself: handle storage and the step loop

pub mod body;
pub mod contact;
pub mod shape;
pub mod world;

pub use body::{BodyDef, BodyKind};
pub use shape::{ShapeDef, ShapeGeom};
pub use world::{BodyKey, PhysicsWorld, ShapeKey, WorldDef};

use glam::Vec2;

/// 2D rotation stored as a cosine/sine pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rot {
    pub c: f32,
    pub s: f32,
}

impl Rot {
    pub const IDENTITY: Self = Self { c: 1.0, s: 0.0 };

    pub fn from_angle(radians: f32) -> Self {
        Self {
            c: radians.cos(),
            s: radians.sin(),
        }
    }

    /// Rotate a vector.
    pub fn apply(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Rotate a vector by the inverse rotation.
    pub fn apply_inv(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }
}

impl Default for Rot {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rigid pose: position plus rotation.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Pose {
    pub pos: Vec2,
    pub rot: Rot,
}

impl Pose {
    pub fn from_position(pos: Vec2) -> Self {
        Self {
            pos,
            rot: Rot::IDENTITY,
        }
    }
}
