//! Room configuration and lifecycle state.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings for one room. Games override the defaults through
/// `GameLogic::room_config()`; the server may override the frame rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Simulation frames per second.
    pub frame_rate: u32,

    /// Send a snapshot every N frames (1 = every frame).
    pub snapshot_every: u32,

    pub allow_spectators: bool,

    /// Maximum spectators per room. 0 means unlimited when allowed.
    pub max_spectators: usize,

    /// Capacity of the room's command channel.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            snapshot_every: 1,
            allow_spectators: true,
            max_spectators: 8,
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// `true` if a room with `current` spectators can take one more.
    pub fn has_spectator_slot(&self, current: usize) -> bool {
        self.allow_spectators && (self.max_spectators == 0 || current < self.max_spectators)
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// Lifecycle of a room.
///
/// ```text
/// Running ⇄ Paused
///    └───────┴──→ Closed
/// ```
///
/// A room is created `Running` (its game starts counting down right away),
/// may be paused and resumed by its seeker any number of times, and
/// closes for good when the seeker leaves or the server shuts it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Running,
    Paused,
    Closed,
}

impl RoomState {
    /// Spectators may join any room that has not closed.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Running, Self::Paused)
                | (Self::Paused, Self::Running)
                | (Self::Running, Self::Closed)
                | (Self::Paused, Self::Closed)
        )
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Paused => write!(f, "Paused"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
