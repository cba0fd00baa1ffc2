//! Body definitions and internal body state.

use glam::Vec2;
use smallvec::SmallVec;

use super::Rot;
use super::world::ShapeKey;

/// How a body participates in the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// Never moves; infinite mass.
    Static,
    /// Fully simulated; moved by forces, impulses, and contacts.
    #[default]
    Dynamic,
    /// Moved only by its own velocity; infinite mass for contact purposes.
    Kinematic,
}

/// Declarative body description consumed once at creation time.
#[derive(Clone, Copy, Debug)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub linear_velocity: Vec2,
    pub linear_damping: f32,
    /// Continuous-collision hint. Stored and surfaced; this engine does not
    /// perform swept collision.
    pub bullet: bool,
    pub rotation_locked: bool,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec2::ZERO,
            linear_velocity: Vec2::ZERO,
            linear_damping: 0.0,
            bullet: false,
            rotation_locked: true,
        }
    }
}

/// Internal body state. Only the world touches this.
#[derive(Clone, Debug)]
pub(crate) struct BodyData {
    pub kind: BodyKind,
    pub pos: Vec2,
    pub rot: Rot,
    pub angle: f32,
    pub linvel: Vec2,
    pub angvel: f32,
    /// Force accumulator, cleared after every step.
    pub force: Vec2,
    pub linear_damping: f32,
    pub bullet: bool,
    pub rotation_locked: bool,
    pub inv_mass: f32,
    /// Shapes attached to this body; released together with it.
    pub shapes: SmallVec<[ShapeKey; 1]>,
}

impl BodyData {
    pub fn from_def(def: &BodyDef) -> Self {
        let inv_mass = match def.kind {
            // A shapeless dynamic body weighs one unit until a shape is
            // attached and mass is recomputed from its area.
            BodyKind::Dynamic => 1.0,
            BodyKind::Static | BodyKind::Kinematic => 0.0,
        };
        Self {
            kind: def.kind,
            pos: def.position,
            rot: Rot::IDENTITY,
            angle: 0.0,
            linvel: def.linear_velocity,
            angvel: 0.0,
            force: Vec2::ZERO,
            linear_damping: def.linear_damping,
            bullet: def.bullet,
            rotation_locked: def.rotation_locked,
            inv_mass,
            shapes: SmallVec::new(),
        }
    }

    pub fn set_mass(&mut self, mass: f32) {
        if self.kind == BodyKind::Dynamic {
            self.inv_mass = if mass > f32::EPSILON { 1.0 / mass } else { 1.0 };
        }
    }
}
