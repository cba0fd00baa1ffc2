//! Per-tick force and impulse accumulators written by behavior scripts.

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Force and impulse requests consumed by the simulation each tick.
///
/// Scripts reset this at the start of their own update, before the state
/// machine runs; the effect-application pass reads but never clears it.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Output {
    /// Continuous force applied to the center of mass.
    pub force: Vec2,
    /// Instantaneous impulse applied to the center of mass.
    pub impulse: Vec2,
}

impl Output {
    pub fn reset(&mut self) {
        self.force = Vec2::ZERO;
        self.impulse = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn reset_zeroes_both_accumulators() {
        let mut output = Output {
            force: vec2(25.0, 0.0),
            impulse: vec2(0.0, 25.0),
        };
        output.reset();
        assert_eq!(output.force, Vec2::ZERO);
        assert_eq!(output.impulse, Vec2::ZERO);
    }
}
