//! Core protocol types: everything that is serialized onto the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A connected player. Assigned by the server during the handshake.
///
/// `#[serde(transparent)]` keeps it a plain number in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// One running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Who receives a server message produced by game logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// The seeker and every spectator.
    All,
    /// One player.
    Player(PlayerId),
    /// Spectators only.
    Spectators,
}

/// How a player takes part in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Controls the seeker. A room has exactly one and closes when it leaves.
    Seeker,
    /// Watches someone else's game.
    Spectator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seeker => write!(f, "seeker"),
            Self::Spectator => write!(f, "spectator"),
        }
    }
}

/// Delivery guarantee for a message.
///
/// Events (captures, jailbreaks) must arrive; frame snapshots are
/// superseded 60 times a second and may be dropped under pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    #[default]
    ReliableOrdered,
    Unreliable,
}

// ---------------------------------------------------------------------------
// SystemMessage: connection and room control
// ---------------------------------------------------------------------------

/// A room in the spectator lobby listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    pub seeker: PlayerId,
    pub spectators: usize,
    pub max_spectators: usize,
}

/// Messages handled by the server itself rather than the game.
///
/// Internally tagged: `{ "type": "StartGame", "seed": 7 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --
    /// Client → Server, first message. `name` is a display name.
    Handshake {
        version: u32,
        #[serde(default)]
        name: Option<String>,
    },

    /// Server → Client: accepted, here is your id.
    HandshakeAck { player_id: PlayerId, server_time: u64 },

    /// Either direction.
    Disconnect { reason: String },

    // -- Heartbeat --
    Heartbeat { client_time: u64 },
    HeartbeatAck { client_time: u64, server_time: u64 },

    // -- Rooms --
    /// Client → Server: start a new round with me as the seeker. A fixed
    /// `seed` replays the same hider placement.
    StartGame {
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Client → Server: watch another player's round.
    Spectate { room_id: RoomId },

    /// Client → Server: freeze my round.
    Pause,

    /// Client → Server: unfreeze my round.
    Resume,

    /// Client → Server: leave the current room. A seeker leaving ends the round.
    LeaveRoom,

    /// Client → Server: list rooms open to spectators.
    ListRooms,

    /// Server → Client.
    RoomList { rooms: Vec<RoomListEntry> },

    /// Server → Client: you are in `room_id` as `role`.
    RoomJoined { room_id: RoomId, role: Role },

    /// Server → Client: the room you were in has closed.
    RoomClosed { room_id: RoomId },

    // -- Errors --
    /// Server → Client. HTTP-style `code` (400, 404, 409...).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload / Envelope
// ---------------------------------------------------------------------------

/// Either a system message or opaque game data.
///
/// Adjacently tagged: `{ "type": "System", "data": { ... } }` or
/// `{ "type": "Game", "data": [..bytes..] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    /// A game `ClientMessage` or `ServerMessage` encoded by the codec.
    Game(Vec<u8>),
}

/// The top-level wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-direction sequence number.
    pub seq: u64,
    /// Milliseconds since the connection was accepted.
    pub timestamp: u64,
    #[serde(default)]
    pub channel: Channel,
    pub payload: Payload,
}

impl Envelope {
    /// A reliable system envelope.
    pub fn system(seq: u64, timestamp: u64, msg: SystemMessage) -> Self {
        Self {
            seq,
            timestamp,
            channel: Channel::ReliableOrdered,
            payload: Payload::System(msg),
        }
    }

    /// A game envelope on the given channel.
    pub fn game(seq: u64, timestamp: u64, channel: Channel, data: Vec<u8>) -> Self {
        Self {
            seq,
            timestamp,
            channel,
            payload: Payload::Game(data),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! These pin the JSON shapes the browser client parses.

    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&RoomId(9)).unwrap(), "9");
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    #[test]
    fn test_role_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Spectator).unwrap(), "\"spectator\"");
        assert_eq!(Role::Seeker.to_string(), "seeker");
    }

    #[test]
    fn test_channel_default_and_format() {
        assert_eq!(Channel::default(), Channel::ReliableOrdered);
        assert_eq!(serde_json::to_string(&Channel::Unreliable).unwrap(), "\"Unreliable\"");
    }

    #[test]
    fn test_handshake_name_is_optional() {
        let msg: SystemMessage = serde_json::from_str(r#"{"type":"Handshake","version":1}"#).unwrap();
        assert_eq!(msg, SystemMessage::Handshake { version: 1, name: None });
    }

    #[test]
    fn test_start_game_json_format() {
        let json = serde_json::to_value(SystemMessage::StartGame { seed: Some(7) }).unwrap();
        assert_eq!(json["type"], "StartGame");
        assert_eq!(json["seed"], 7);

        let msg: SystemMessage = serde_json::from_str(r#"{"type":"StartGame"}"#).unwrap();
        assert_eq!(msg, SystemMessage::StartGame { seed: None });
    }

    #[test]
    fn test_room_joined_json_format() {
        let json = serde_json::to_value(SystemMessage::RoomJoined {
            room_id: RoomId(5),
            role: Role::Seeker,
        })
        .unwrap();
        assert_eq!(json["type"], "RoomJoined");
        assert_eq!(json["room_id"], 5);
        assert_eq!(json["role"], "seeker");
    }

    #[test]
    fn test_error_json_format() {
        let json = serde_json::to_value(SystemMessage::Error {
            code: 404,
            message: "room R-9 not found".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], 404);
    }

    #[test]
    fn test_room_list_round_trip() {
        let msg = SystemMessage::RoomList {
            rooms: vec![RoomListEntry {
                room_id: RoomId(1),
                seeker: PlayerId(4),
                spectators: 1,
                max_spectators: 8,
            }],
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        assert_eq!(serde_json::from_slice::<SystemMessage>(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_payload_shapes() {
        let json = serde_json::to_value(Payload::System(SystemMessage::Pause)).unwrap();
        assert_eq!(json["type"], "System");
        assert_eq!(json["data"]["type"], "Pause");

        let json = serde_json::to_value(Payload::Game(vec![1, 2, 3])).unwrap();
        assert_eq!(json["type"], "Game");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_envelope_channel_defaults_when_missing() {
        let json = r#"{ "seq": 1, "timestamp": 100, "payload": { "type": "Game", "data": [1] } }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.channel, Channel::ReliableOrdered);
    }

    #[test]
    fn test_envelope_constructors() {
        let e = Envelope::system(3, 10, SystemMessage::LeaveRoom);
        assert_eq!(e.channel, Channel::ReliableOrdered);
        let e = Envelope::game(4, 11, Channel::Unreliable, vec![9]);
        assert_eq!(e.payload, Payload::Game(vec![9]));
        assert_eq!(e.channel, Channel::Unreliable);
    }

    #[test]
    fn test_unknown_system_message_type_is_rejected() {
        let result: Result<SystemMessage, _> = serde_json::from_str(r#"{"type":"FlyToMoon"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_garbage_is_not_an_envelope() {
        assert!(serde_json::from_slice::<Envelope>(b"not json").is_err());
        assert!(serde_json::from_str::<Envelope>(r#"{"name":"x"}"#).is_err());
    }
}
