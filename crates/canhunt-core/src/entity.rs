//! The entities on the field: seeker, hiders, can and jail.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};

/// Index of a hider, stable for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HiderId(pub u8);

impl fmt::Display for HiderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H-{}", self.0)
    }
}

/// Per-hider lifecycle.
///
/// ```text
/// Hiding --seeker contact in light--> Jailed
/// Hiding --can contact-------------> Freeing
/// Jailed | Freeing --jailbreak-----> Hiding
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiderState {
    /// Free and steering toward the can.
    Hiding,
    /// Caught; held inside the jail until a jailbreak.
    Jailed,
    /// Touched the can; the jailbreak fires shortly.
    Freeing,
}

impl HiderState {
    pub fn is_hiding(self) -> bool {
        matches!(self, Self::Hiding)
    }
}

impl fmt::Display for HiderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hiding => write!(f, "hiding"),
            Self::Jailed => write!(f, "jailed"),
            Self::Freeing => write!(f, "freeing"),
        }
    }
}

/// The player-controlled seeker.
#[derive(Debug, Clone, PartialEq)]
pub struct Seeker {
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f32,
    pub flashlight_radius: f32,
    pub contact_radius: f32,
}

impl Seeker {
    /// `true` if `point` is lit by the flashlight (boundary included).
    pub fn illuminates(&self, point: Vec2) -> bool {
        self.position.distance(point) <= self.flashlight_radius
    }
}

/// An AI-controlled hider.
#[derive(Debug, Clone, PartialEq)]
pub struct Hider {
    pub id: HiderId,
    pub name: String,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Facing angle in radians; hiders move along it.
    pub heading: f32,
    pub state: HiderState,
    pub contact_radius: f32,
    /// Render alpha: 1 inside the flashlight, dimmed outside.
    pub alpha: f32,
    pub label_visible: bool,
}

impl Hider {
    pub fn new(id: HiderId, position: Vec2, contact_radius: f32) -> Self {
        Self {
            id,
            name: format!("Player {}", u16::from(id.0) + 1),
            position,
            velocity: Vec2::ZERO,
            heading: 0.0,
            state: HiderState::Hiding,
            contact_radius,
            alpha: 1.0,
            label_visible: true,
        }
    }
}

/// The can at the centre of the field. Never moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Can {
    pub position: Vec2,
    pub contact_radius: f32,
}

/// The jail zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jail {
    pub zone: Rect,
    /// Area jailed hiders are placed in: the zone minus its inset.
    pub holding_area: Rect,
}

impl Jail {
    pub fn new(zone: Rect, inset: f32) -> Self {
        Self {
            zone,
            holding_area: zone.inset(inset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hider_names_are_one_based() {
        let h = Hider::new(HiderId(0), Vec2::ZERO, 16.0);
        assert_eq!(h.name, "Player 1");
        assert_eq!(h.state, HiderState::Hiding);
        assert_eq!(Hider::new(HiderId(2), Vec2::ZERO, 16.0).name, "Player 3");
    }

    #[test]
    fn test_flashlight_boundary_is_lit() {
        let seeker = Seeker {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            speed: 180.0,
            flashlight_radius: 150.0,
            contact_radius: 16.0,
        };
        assert!(seeker.illuminates(Vec2::new(150.0, 0.0)));
        assert!(!seeker.illuminates(Vec2::new(150.5, 0.0)));
    }

    #[test]
    fn test_hider_state_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&HiderState::Freeing).unwrap(), "\"freeing\"");
    }

    #[test]
    fn test_jail_holding_area_is_inset() {
        let jail = Jail::new(Rect::new(Vec2::new(650.0, 50.0), 120.0, 200.0), 10.0);
        assert_eq!(jail.holding_area.min(), Vec2::new(600.0, -40.0));
        assert_eq!(jail.holding_area.max(), Vec2::new(700.0, 140.0));
    }
}
