//! Transient lifecycle markers for physics bodies.

use bevy_ecs::prelude::Component;

/// Requests a native body for this entity. Removed by the creation pass
/// once the body exists.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct SpawnPhysics;

/// Requests release of this entity's native body. Removed together with the
/// [`Body`](super::body::Body) component by the destruction pass.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct DespawnPhysics;
