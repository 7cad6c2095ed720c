//! `CanhuntServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use canhunt_core::GameConfig;
use canhunt_protocol::{Codec, JsonCodec};
use canhunt_room::{GameLogic, RoomConfig, RoomManager};
use canhunt_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{CanhuntError, KickTheCan};

/// Clients must send this in their handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// How long a connection may stay silent before it is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared by every connection task.
pub(crate) struct ServerState<G: GameLogic, C: Codec> {
    pub(crate) rooms: Mutex<RoomManager<G>>,
    pub(crate) codec: C,
    pub(crate) game_config: G::Config,
    /// Player ids are handed out in connection order, starting at 1.
    pub(crate) next_player_id: AtomicU64,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Canhunt server.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), canhunt::CanhuntError> {
/// use canhunt::prelude::*;
///
/// let server = CanhuntServer::builder()
///     .bind("0.0.0.0:8080")
///     .frame_rate(30)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct CanhuntServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    room_config: RoomConfig,
    idle_timeout: Duration,
}

impl CanhuntServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
            room_config: KickTheCan::room_config(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Port 0 picks a free port; see [`CanhuntServer::local_addr`].
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Tuning for every round this server starts.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    pub fn frame_rate(mut self, hz: u32) -> Self {
        self.room_config.frame_rate = hz;
        self
    }

    pub fn max_spectators(mut self, max: usize) -> Self {
        self.room_config.max_spectators = max;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Validates the game config and binds the listener. Uses
    /// `JsonCodec` over `WebSocketTransport`.
    pub async fn build(self) -> Result<CanhuntServer, CanhuntError> {
        self.game_config.validate()?;
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::with_room_config(self.room_config)),
            codec: JsonCodec,
            game_config: self.game_config,
            next_player_id: AtomicU64::new(1),
            idle_timeout: self.idle_timeout,
        });

        Ok(CanhuntServer { transport, state })
    }
}

impl Default for CanhuntServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Canhunt server. Call [`run()`](Self::run) to start accepting
/// connections.
pub struct CanhuntServer {
    transport: WebSocketTransport,
    state: Arc<ServerState<KickTheCan, JsonCodec>>,
}

impl CanhuntServer {
    pub fn builder() -> CanhuntServerBuilder {
        CanhuntServerBuilder::new()
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, CanhuntError> {
        Ok(self.transport.local_addr()?)
    }

    /// Accepts connections and spawns a handler task for each, until the
    /// process is terminated. Failed accepts are logged and skipped.
    pub async fn run(mut self) -> Result<(), CanhuntError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Canhunt server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
