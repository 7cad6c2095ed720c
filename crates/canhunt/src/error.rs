//! Unified error type for the Canhunt server.

use std::path::PathBuf;

use canhunt_core::ConfigError;
use canhunt_protocol::ProtocolError;
use canhunt_room::RoomError;
use canhunt_transport::TransportError;

/// Top-level error that wraps all crate-specific errors, so `?` works
/// across layers.
#[derive(Debug, thiserror::Error)]
pub enum CanhuntError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    /// The game tuning failed validation.
    #[error("invalid game config: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
