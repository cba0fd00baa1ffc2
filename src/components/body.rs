//! Native physics handles held by an entity.

use bevy_ecs::prelude::Component;

use crate::physics::{BodyKey, ShapeKey};

/// The entity's native rigid body and collider.
///
/// Present only between the body-creation and body-destruction passes; the
/// lifecycle passes are the single writer of this component.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Body {
    pub body: BodyKey,
    pub shape: ShapeKey,
}
