//! Wire protocol for Canhunt.
//!
//! Everything a browser client and the server exchange:
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`Channel`], ...): the
//!   message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages become
//!   bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! Game-specific messages (seeker input, frame snapshots) ride inside
//! [`Payload::Game`] as opaque bytes, so this crate knows nothing about
//! the rules of the game.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room (game messages)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Channel, Envelope, Payload, PlayerId, Recipient, Role, RoomId, RoomListEntry, SystemMessage,
};
