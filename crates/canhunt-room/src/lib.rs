//! Room hosting for Canhunt.
//!
//! Each running game lives in its own Tokio task (actor model) that owns
//! the game state, the seeker's outbound channel, any spectators, and a
//! [`canhunt_tick::FrameClock`] driving the simulation.
//!
//! # Key types
//!
//! - [`GameLogic`]: the trait a game implements
//! - [`RoomManager`]: creates and destroys rooms, routes players
//! - [`RoomHandle`]: sends commands to a running room actor
//! - [`RoomState`]: Running, Paused, Closed
//! - [`RoomConfig`]: frame rate and spectator limits

mod config;
mod error;
mod logic;
mod manager;
mod room;

pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use logic::GameLogic;
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle, RoomInfo, RoomOutbound};
