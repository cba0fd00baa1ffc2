//! ECS components for entities.
//!
//! Components define the data attached to entities in the game world.
//!
//! Submodules overview:
//! - [`body`] – native physics handles held by an entity
//! - [`bodydesc`] – declarative movement and shape descriptors
//! - [`input`] – digital input state read by behavior scripts
//! - [`output`] – per-tick force/impulse accumulators
//! - [`tags`] – transient body lifecycle markers
//! - [`transform`] – world-space pose with a sprite-facing flip

pub mod body;
pub mod bodydesc;
pub mod input;
pub mod output;
pub mod tags;
pub mod transform;
