//! 2D vector and rectangle math used by the simulation.
//!
//! Screen coordinates: x grows to the right, y grows downward, angles are
//! in radians measured from the +x axis (so +pi/2 points down).

use std::f32::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point or vector in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle`.
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Returns the unit vector in the same direction.
    ///
    /// A zero vector stays zero instead of turning into NaNs.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            self
        }
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Angle of this vector, in `(-pi, pi]`.
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Angle of the line from `self` to `target`.
    pub fn angle_to(self, target: Self) -> f32 {
        (target - self).angle()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Wraps an angle into `[-pi, pi)`.
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Turns `current` toward `target` by at most `max_step` radians, taking
/// the shorter way around. Lands exactly on `target` when it is closer
/// than one step.
pub fn rotate_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let diff = wrap_angle(target - current);
    if diff.abs() <= max_step {
        wrap_angle(target)
    } else {
        wrap_angle(current + max_step.copysign(diff))
    }
}

/// `true` when two circles overlap (touching edges do not count).
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// An axis-aligned rectangle described by its centre, like an engine zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            center,
            width,
            height,
        }
    }

    /// Top-left corner.
    pub fn min(&self) -> Vec2 {
        Vec2::new(
            self.center.x - self.width / 2.0,
            self.center.y - self.height / 2.0,
        )
    }

    /// Bottom-right corner.
    pub fn max(&self) -> Vec2 {
        Vec2::new(
            self.center.x + self.width / 2.0,
            self.center.y + self.height / 2.0,
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    /// Shrinks the rectangle by `margin` on every side. Never goes below
    /// zero size.
    pub fn inset(&self, margin: f32) -> Self {
        Self {
            center: self.center,
            width: (self.width - 2.0 * margin).max(0.0),
            height: (self.height - 2.0 * margin).max(0.0),
        }
    }
}
