//! Discrete gameplay events emitted by [`GameSession::update`](crate::GameSession::update).

use serde::{Deserialize, Serialize};

use crate::entity::HiderId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// The whole-second countdown value changed.
    CountdownTick { seconds_left: u32 },
    /// The countdown ended; the seeker may move.
    RoundStarted,
    /// The seeker caught a hider in the light.
    Captured { hider: HiderId, name: String },
    /// A hider reached the can; a jailbreak is pending.
    JailbreakStarted { hider: HiderId, name: String },
    /// Every hider was set free. `released` counts those that were not
    /// already hiding.
    Jailbreak { released: usize },
}
