//! # Canhunt
//!
//! A server-authoritative kick-the-can game. The seeker's browser sends
//! the arrow keys it is holding; the server runs the round in a room actor
//! at a fixed frame rate and streams back snapshots and events.
//!
//! ```text
//! WebSocket (bytes) → Envelope (protocol) → RoomManager → room actor
//!                                                         └─ GameSession
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canhunt::prelude::*;
//!
//! # async fn run() -> Result<(), CanhuntError> {
//! let server = CanhuntServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .game_config(GameConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod game;
mod handler;
mod server;

pub use config::{load_game_config, Args};
pub use error::CanhuntError;
pub use game::{ClientMessage, KickTheCan, KickTheCanState, ServerMessage};
pub use server::{CanhuntServer, CanhuntServerBuilder, DEFAULT_IDLE_TIMEOUT, PROTOCOL_VERSION};

/// Everything a server binary or a test client needs in one import.
pub mod prelude {
    pub use crate::{
        CanhuntError, CanhuntServer, CanhuntServerBuilder, ClientMessage, KickTheCan,
        ServerMessage, PROTOCOL_VERSION,
    };
    pub use canhunt_core::{GameConfig, GameEvent, Input, Snapshot};
    pub use canhunt_protocol::{
        Channel, Envelope, Payload, PlayerId, Role, RoomId, RoomListEntry, SystemMessage,
    };
    pub use canhunt_room::{GameLogic, RoomConfig};
}
