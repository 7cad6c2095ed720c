//! Error types for the protocol layer.

/// Errors raised while encoding, decoding or validating messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A value could not be serialized.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes are not a valid message: malformed JSON, a missing
    /// field, an unknown `type` tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but breaks a protocol rule, such as a
    /// first message that is not a handshake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
