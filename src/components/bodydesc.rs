//! Declarative physics body descriptors.
//!
//! These components describe the body an entity should receive; they are
//! consumed by the body-creation pass and never mutated afterwards. An
//! entity tagged for creation must carry a [`MovementDesc`] and exactly one
//! of [`CapsuleDesc`] or [`BoxDesc`].

use bevy_ecs::prelude::Component;

use crate::physics::BodyKind;

/// Surface material shared by the shape descriptors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self { friction: 0.6 }
    }
}

/// How the body moves: kind, damping, continuous collision, rotation lock.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct MovementDesc {
    pub kind: BodyKind,
    pub bullet: bool,
    pub linear_damping: f32,
    pub rotation_locked: bool,
}

impl Default for MovementDesc {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            bullet: false,
            linear_damping: 0.0,
            rotation_locked: true,
        }
    }
}

/// Vertical capsule collider description.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct CapsuleDesc {
    pub half_height: f32,
    pub radius: f32,
    pub material: Material,
}

impl CapsuleDesc {
    pub fn new(half_height: f32, radius: f32) -> Self {
        Self {
            half_height,
            radius,
            material: Material::default(),
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.material.friction = friction;
        self
    }
}

/// Rectangle collider description.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct BoxDesc {
    pub half_width: f32,
    pub half_height: f32,
    pub material: Material,
}

impl BoxDesc {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_width,
            half_height,
            material: Material::default(),
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.material.friction = friction;
        self
    }
}
