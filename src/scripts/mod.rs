//! Behavior scripts and the state machine framework that drives them.
//!
//! - [`machine`] – generic enter/update/exit state machine over a context
//! - [`player`] – the player's movement script and its states

pub mod machine;
pub mod player;
