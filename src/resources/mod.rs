//! ECS resources made available to systems.
//!
//! Overview
//! - [`simulation`] – the physics world, its worker pool, and handle tables

pub mod simulation;
