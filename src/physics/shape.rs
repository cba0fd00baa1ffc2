//! Shape definitions and collider geometry.

use glam::Vec2;

use super::contact::Prim;
use super::{Pose, world::BodyKey};

/// Thickness given to segment colliders so thin geometry still produces
/// contacts.
pub(crate) const SEGMENT_SKIN: f32 = 0.01;

/// Collider geometry, expressed in the owning body's local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeGeom {
    /// Vertical capsule centered on the body origin.
    Capsule { half_height: f32, radius: f32 },
    /// Rectangle centered on the body origin.
    Box { half_width: f32, half_height: f32 },
    /// One-dimensional wall or floor between two local points.
    Segment { p1: Vec2, p2: Vec2 },
}

impl ShapeGeom {
    /// Surface area used for mass computation (unit density).
    pub(crate) fn area(&self) -> f32 {
        match *self {
            ShapeGeom::Capsule {
                half_height,
                radius,
            } => 4.0 * radius * half_height + std::f32::consts::PI * radius * radius,
            ShapeGeom::Box {
                half_width,
                half_height,
            } => 4.0 * half_width * half_height,
            ShapeGeom::Segment { .. } => 0.0,
        }
    }

    /// Collision primitive for this geometry at a world pose.
    pub(crate) fn prim(&self, pose: &Pose) -> Prim {
        match *self {
            ShapeGeom::Capsule {
                half_height,
                radius,
            } => {
                let axis = pose.rot.apply(Vec2::new(0.0, half_height));
                Prim::Capsule {
                    p1: pose.pos + axis,
                    p2: pose.pos - axis,
                    radius,
                }
            }
            ShapeGeom::Box {
                half_width,
                half_height,
            } => Prim::Obb {
                center: pose.pos,
                rot: pose.rot,
                half: Vec2::new(half_width, half_height),
            },
            ShapeGeom::Segment { p1, p2 } => Prim::Capsule {
                p1: pose.pos + pose.rot.apply(p1),
                p2: pose.pos + pose.rot.apply(p2),
                radius: SEGMENT_SKIN,
            },
        }
    }
}

/// Non-geometric shape parameters.
#[derive(Clone, Copy, Debug)]
pub struct ShapeDef {
    pub friction: f32,
    /// Contacts involving this shape are offered to the pre-solve callback.
    pub enable_pre_solve: bool,
}

impl Default for ShapeDef {
    fn default() -> Self {
        Self {
            friction: 0.6,
            enable_pre_solve: false,
        }
    }
}

/// Internal shape state. Only the world touches this.
#[derive(Clone, Debug)]
pub(crate) struct ShapeData {
    pub body: BodyKey,
    pub geom: ShapeGeom,
    pub friction: f32,
    pub enable_pre_solve: bool,
}
