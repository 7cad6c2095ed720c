//! The `GameLogic` trait: what a room needs from a game.
//!
//! The room owns the clock, the subscribers and the channels; the game
//! only answers "what happens on this message" and "what happens on this
//! frame".

use std::time::Duration;

use canhunt_protocol::{PlayerId, Recipient};
use serde::{de::DeserializeOwned, Serialize};

use crate::RoomConfig;

/// A real-time, single-seeker game hosted by a room.
///
/// All methods are associated functions over `State`, so the game type
/// itself is a zero-sized marker.
pub trait GameLogic: Send + Sync + 'static {
    /// Game tuning chosen by the server operator.
    type Config: Send + Sync + Clone + Default + 'static;

    /// Everything the simulation owns.
    type State: Send + 'static;

    /// What the seeker's client sends (key state, restart).
    type ClientMessage: Send + Sync + Clone + Serialize + DeserializeOwned + 'static;

    /// What the room sends back (snapshots, events).
    type ServerMessage: Send + Sync + Clone + Serialize + DeserializeOwned + 'static;

    /// Why a game could not be created.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates the state for a new round. `seed` drives all randomness.
    fn init(config: &Self::Config, seeker: PlayerId, seed: u64) -> Result<Self::State, Self::Error>;

    /// Applies one message from the seeker.
    fn handle_message(
        state: &mut Self::State,
        sender: PlayerId,
        msg: Self::ClientMessage,
    ) -> Vec<(Recipient, Self::ServerMessage)>;

    /// Advances the simulation by one frame. Returned messages are
    /// delivered reliably, before the frame's snapshot.
    fn tick(state: &mut Self::State, dt: Duration) -> Vec<(Recipient, Self::ServerMessage)>;

    /// The per-frame view sent to every subscriber on the unreliable channel.
    fn snapshot(state: &Self::State) -> Self::ServerMessage;

    /// Checked before `handle_message`; `Err` drops the message and is
    /// logged. Default: accept all.
    fn validate_message(
        _state: &Self::State,
        _sender: PlayerId,
        _msg: &Self::ClientMessage,
    ) -> Result<(), String> {
        Ok(())
    }

    fn room_config() -> RoomConfig {
        RoomConfig::default()
    }
}
