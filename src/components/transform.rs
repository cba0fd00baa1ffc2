//! World-space pose component with a sprite-facing flip.
//!
//! The [`Transform`] is written by the simulation after every physics step
//! and read by behavior scripts and downstream consumers (rendering,
//! animation). The `flip` scalar mirrors the sprite horizontally; it only
//! ever affects the X row of the rendering matrix, never the physics pose.

use bevy_ecs::prelude::Component;
use glam::{Mat3, Vec2, Vec3};

use crate::physics::{Pose, Rot};

#[derive(Component, Clone, Copy, Debug)]
pub struct Transform {
    pub pos: Vec2,
    pub rot: Rot,
    /// Facing mirror, `1.0` or `-1.0`. Applied only to the X row of
    /// [`Transform::matrix`].
    pub flip: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            rot: Rot::IDENTITY,
            flip: 1.0,
        }
    }
}

impl Transform {
    pub fn from_position(x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            ..Default::default()
        }
    }

    /// Copy a physics pose into this transform, preserving the flip.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pos = pose.pos;
        self.rot = pose.rot;
    }

    pub fn pose(&self) -> Pose {
        Pose {
            pos: self.pos,
            rot: self.rot,
        }
    }

    pub fn set_flip(&mut self, flip: f32) {
        self.flip = flip;
    }

    /// Affine matrix for rendering. The flip mirrors the X row only.
    pub fn matrix(&self) -> Mat3 {
        Mat3::from_cols(
            Vec3::new(self.flip * self.rot.c, -self.rot.s, 0.0),
            Vec3::new(self.flip * self.rot.s, self.rot.c, 0.0),
            Vec3::new(self.pos.x, self.pos.y, 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn set_pose_keeps_the_flip() {
        let mut transform = Transform::from_position(0.0, 0.0);
        transform.set_flip(-1.0);
        transform.set_pose(Pose {
            pos: vec2(3.0, 4.0),
            rot: Rot::from_angle(0.5),
        });
        assert!((transform.pos.x - 3.0).abs() < EPSILON);
        assert!((transform.pos.y - 4.0).abs() < EPSILON);
        assert!((transform.flip + 1.0).abs() < EPSILON);
    }

    #[test]
    fn flip_mirrors_only_the_x_row() {
        let mut transform = Transform::from_position(1.0, 2.0);
        transform.rot = Rot::from_angle(0.3);
        let plain = transform.matrix();
        transform.set_flip(-1.0);
        let flipped = transform.matrix();

        // X row changes sign, Y row and translation are untouched.
        assert!((flipped.x_axis.x + plain.x_axis.x).abs() < EPSILON);
        assert!((flipped.y_axis.x + plain.y_axis.x).abs() < EPSILON);
        assert!((flipped.x_axis.y - plain.x_axis.y).abs() < EPSILON);
        assert!((flipped.y_axis.y - plain.y_axis.y).abs() < EPSILON);
        assert!((flipped.z_axis.x - plain.z_axis.x).abs() < EPSILON);
        assert!((flipped.z_axis.y - plain.z_axis.y).abs() < EPSILON);
    }
}
