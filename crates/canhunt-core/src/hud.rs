//! On-screen text: countdown, floating capture messages and the jailbreak
//! banner. The client draws whatever the HUD currently holds.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

pub const JAILBREAK_BANNER: &str = "Jailbreak!";

/// A short-lived message drawn at a world position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingText {
    pub id: u64,
    pub text: String,
    pub position: Vec2,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    /// "Hide! N" while counting down, `None` once play starts.
    pub countdown: Option<String>,
    pub messages: Vec<FloatingText>,
    /// Shown after the first jailbreak and kept for the rest of the round.
    pub banner: Option<String>,
    #[serde(skip)]
    next_id: u64,
}

impl Hud {
    pub fn set_countdown(&mut self, seconds_left: u32) {
        self.countdown = Some(format!("Hide! {seconds_left}"));
    }

    pub fn clear_countdown(&mut self) {
        self.countdown = None;
    }

    /// Adds a floating message and returns its id for later removal.
    pub fn push_message(&mut self, text: String, position: Vec2) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(FloatingText { id, text, position });
        id
    }

    pub fn remove_message(&mut self, id: u64) {
        self.messages.retain(|m| m.id != id);
    }

    pub fn show_banner(&mut self, text: &str) {
        self.banner = Some(text.to_string());
    }
}
