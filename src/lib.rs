//! Ledgecore library.
//!
//! The real-time simulation core of a 2D platformer: a fixed-timestep
//! physics pipeline with lazily created bodies, a bounded worker pool
//! bridging the engine's parallel solve, and state-machine-driven behavior
//! scripts, all on top of a `bevy_ecs` registry.

pub mod components;
pub mod error;
pub mod game;
pub mod physics;
pub mod resources;
pub mod scripts;
pub mod systems;
pub mod tasks;
