//! Gameplay rules for Canhunt.
//!
//! A seeker ("It") hunts AI hiders with a flashlight. Hiders caught inside
//! the light go to jail; a free hider reaching the can sets everyone loose
//! again. This crate is the whole rulebook and knows nothing about
//! networking or rendering: feed [`GameSession::update`] a frame delta and
//! the held keys, get back [`GameEvent`]s and a [`Snapshot`] to draw.
//!
//! ```rust
//! use std::time::Duration;
//! use canhunt_core::{GameConfig, GameSession, Input};
//!
//! let mut session = GameSession::new(GameConfig::default(), 42).unwrap();
//! let events = session.update(Duration::from_millis(16), &Input::default());
//! assert!(!events.is_empty()); // "Hide! 3"
//! ```

mod config;
mod entity;
mod error;
mod event;
mod geometry;
mod hud;
mod input;
mod session;
mod snapshot;
mod timer;

pub use config::{
    CanConfig, GameConfig, HiderConfig, JailConfig, SeekerConfig, WorldConfig, MAX_TIMING_SECS,
};
pub use entity::{Can, Hider, HiderId, HiderState, Jail, Seeker};
pub use error::ConfigError;
pub use event::GameEvent;
pub use geometry::{circles_overlap, rotate_toward, wrap_angle, Rect, Vec2};
pub use hud::{FloatingText, Hud, JAILBREAK_BANNER};
pub use input::Input;
pub use session::{GameSession, Phase};
pub use snapshot::{HiderView, Light, SeekerView, Snapshot};
pub use timer::Timers;
