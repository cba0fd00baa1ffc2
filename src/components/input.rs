//! Digital input state read by behavior scripts.
//!
//! Filled in by the surrounding input layer; the simulation core only ever
//! reads it.

use bevy_ecs::prelude::Component;

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Input {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub attack: bool,
}
