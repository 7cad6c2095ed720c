//! Error types for the room layer.

use canhunt_protocol::{PlayerId, RoomId};

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// No spectator slot left, or the room does not take spectators.
    #[error("room {0} is not accepting spectators")]
    SpectatorsFull(RoomId),

    /// A player can be in at most one room.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    #[error("player {0} is not in any room")]
    NotInAnyRoom(PlayerId),

    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// Only the seeker may steer, pause or restart the game.
    #[error("player {0} is not the seeker of room {1}")]
    NotSeeker(PlayerId, RoomId),

    /// The room is in a state that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The game refused to start (bad configuration).
    #[error("game failed to start: {0}")]
    GameInit(String),

    /// The room's command channel is full or its actor has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
