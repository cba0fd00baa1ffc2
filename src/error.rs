//! Error taxonomy for the simulation core.
//!
//! Only configuration mistakes surface as errors: an entity tagged for body
//! creation must carry a movement descriptor and exactly one shape
//! descriptor. Everything else in the pipeline is either infallible or
//! compensated internally (the task scheduler falls back to inline execution
//! when its slot pool is exhausted).

use bevy_ecs::prelude::Entity;
use thiserror::Error;

/// Fatal configuration errors raised by the body-creation pass.
///
/// A failed creation pass allocates no native resources: descriptors are
/// validated for every tagged entity before the first body is created, so an
/// error never leaves a half-created body behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// An entity tagged for body creation has no `MovementDesc` component.
    #[error("entity {0:?} is tagged for body creation but has no movement descriptor")]
    MissingMovementDesc(Entity),

    /// An entity tagged for body creation has neither a capsule nor a box
    /// shape descriptor.
    #[error("entity {0:?} is tagged for body creation but has no shape descriptor")]
    MissingShapeDesc(Entity),
}
