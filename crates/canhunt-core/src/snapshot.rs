//! Render-ready view of a session, sent to clients every frame.

use serde::{Deserialize, Serialize};

use crate::entity::{Can, HiderId, HiderState};
use crate::geometry::{Rect, Vec2};
use crate::hud::Hud;
use crate::session::Phase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub frame: u64,
    pub phase: Phase,
    pub seeker: SeekerView,
    /// The hole cut into the darkness overlay.
    pub light: Light,
    pub hiders: Vec<HiderView>,
    pub can: Can,
    pub jail: Rect,
    pub hud: Hud,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekerView {
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub center: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiderView {
    pub id: HiderId,
    pub name: String,
    pub position: Vec2,
    pub heading: f32,
    pub state: HiderState,
    pub alpha: f32,
    pub label_position: Vec2,
    pub label_visible: bool,
}
