//! Keyboard state forwarded by the client each frame.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Which arrow keys are currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Input {
    /// Seeker velocity for this key state.
    ///
    /// Opposing keys do not cancel: right overrides left and down overrides
    /// up. The result is scaled to `speed` so diagonals are not faster.
    pub fn velocity(&self, speed: f32) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.left {
            v.x = -speed;
        }
        if self.right {
            v.x = speed;
        }
        if self.up {
            v.y = -speed;
        }
        if self.down {
            v.y = speed;
        }
        v.normalize() * speed
    }

    pub fn is_idle(&self) -> bool {
        !(self.left || self.right || self.up || self.down)
    }
}
