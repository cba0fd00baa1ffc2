//! Engine systems.
//!
//! This module groups the ECS systems that advance the simulation.
//!
//! Submodules overview
//! - [`script`] – initialize and drive behavior scripts
//! - [`simulation`] – the fixed per-tick physics pipeline

pub mod script;
pub mod simulation;
