//! Kick the can as a [`GameLogic`]: the glue between a room actor and a
//! [`GameSession`].

use std::time::Duration;

use canhunt_core::{ConfigError, GameConfig, GameEvent, GameSession, Input, Snapshot};
use canhunt_protocol::{PlayerId, Recipient};
use canhunt_room::GameLogic;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Marker type hosting one kick-the-can round per room.
#[derive(Debug)]
pub struct KickTheCan;

/// Room-side state: the round plus the keys the seeker is holding.
#[derive(Debug)]
pub struct KickTheCanState {
    pub session: GameSession,
    /// Latest key state; applied to every frame until the next `Input`.
    pub input: Input,
    pub seeker: PlayerId,
    pub seed: u64,
}

/// Seeker → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// The arrow keys currently held. Sent on change, not every frame.
    Input(Input),
    /// Throw the round away and start over. No seed picks a random one.
    Restart {
        #[serde(default)]
        seed: Option<u64>,
    },
}

/// Server → seeker and spectators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// Everything needed to draw one frame.
    Snapshot(Snapshot),
    Event(GameEvent),
    /// A new round began with this seed.
    Restarted { seed: u64 },
}

impl GameLogic for KickTheCan {
    type Config = GameConfig;
    type State = KickTheCanState;
    type ClientMessage = ClientMessage;
    type ServerMessage = ServerMessage;
    type Error = ConfigError;

    fn init(config: &GameConfig, seeker: PlayerId, seed: u64) -> Result<KickTheCanState, ConfigError> {
        Ok(KickTheCanState {
            session: GameSession::new(config.clone(), seed)?,
            input: Input::default(),
            seeker,
            seed,
        })
    }

    fn handle_message(
        state: &mut KickTheCanState,
        sender: PlayerId,
        msg: ClientMessage,
    ) -> Vec<(Recipient, ServerMessage)> {
        match msg {
            ClientMessage::Input(input) => {
                tracing::trace!(%sender, ?input, "input");
                state.input = input;
                vec![]
            }
            ClientMessage::Restart { seed } => {
                let seed = seed.unwrap_or_else(|| rand::rng().random());
                // The config was validated when the round first started.
                match GameSession::new(state.session.config().clone(), seed) {
                    Ok(session) => {
                        state.session = session;
                        state.input = Input::default();
                        state.seed = seed;
                        tracing::info!(%sender, seed, "round restarted");
                        vec![(Recipient::All, ServerMessage::Restarted { seed })]
                    }
                    Err(e) => {
                        tracing::warn!(%sender, error = %e, "restart rejected");
                        vec![]
                    }
                }
            }
        }
    }

    fn tick(state: &mut KickTheCanState, dt: Duration) -> Vec<(Recipient, ServerMessage)> {
        state
            .session
            .update(dt, &state.input)
            .into_iter()
            .map(|event| (Recipient::All, ServerMessage::Event(event)))
            .collect()
    }

    fn snapshot(state: &KickTheCanState) -> ServerMessage {
        ServerMessage::Snapshot(state.session.snapshot())
    }
}
