//! Per-connection handler: handshake, then message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version → assign a PlayerId
//!   2. Send HandshakeAck
//!   3. Loop: inbound envelopes, outbound room messages and the idle
//!      deadline, whichever comes first

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use canhunt_protocol::{
    Channel, Codec, Envelope, Payload, PlayerId, ProtocolError, Role, RoomId, RoomListEntry,
    SystemMessage,
};
use canhunt_room::{GameLogic, RoomError, RoomOutbound};
use canhunt_transport::{Connection, WebSocketConnection};
use rand::Rng;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::CanhuntError;
use crate::server::{PROTOCOL_VERSION, ServerState};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

type RoomReceiver<G> = mpsc::UnboundedReceiver<RoomOutbound<G>>;

/// Takes the player out of their room when the handler exits, however it
/// exits. `Drop` is synchronous, so the async leave runs in its own task.
struct RoomGuard<G: GameLogic, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<G, C>>,
}

impl<G: GameLogic, C: Codec> Drop for RoomGuard<G, C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            if rooms.player_room(&player_id).is_some() {
                let _ = rooms.leave_room(player_id).await;
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<G, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<G, C>>,
) -> Result<(), CanhuntError>
where
    G: GameLogic,
    C: Codec,
{
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    let mut outbox = Outbox::new(&conn, &state.codec);
    let player_id = perform_handshake(&conn, &state, &mut outbox).await?;
    tracing::info!(%conn_id, %player_id, "player connected");

    let _guard = RoomGuard {
        player_id,
        state: Arc::clone(&state),
    };
    let mut client = Client::<G, C> {
        state: &state,
        player_id,
        outbox,
        room: None,
    };

    let idle = state.idle_timeout;
    let mut deadline = idle_deadline(idle);

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                };
                deadline = idle_deadline(idle);

                let envelope: Envelope = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                        continue;
                    }
                };

                let should_close = match envelope.payload {
                    Payload::System(msg) => client.handle_system(msg).await?,
                    Payload::Game(data) => {
                        client.handle_game(&data).await?;
                        false
                    }
                };
                if should_close {
                    break;
                }
            }
            outbound = next_outbound(&mut client.room) => {
                client.forward(outbound).await?;
            }
            _ = tokio::time::sleep_until(deadline) => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        }
    }

    let _ = conn.close().await;
    Ok(())
}

/// Receives from the current room, or waits forever when not in one.
async fn next_outbound<G: GameLogic>(
    room: &mut Option<(RoomId, RoomReceiver<G>)>,
) -> Option<RoomOutbound<G>> {
    match room {
        Some((_, rx)) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Receives `Handshake`, checks the version, assigns a player id and
/// sends `HandshakeAck`.
async fn perform_handshake<G, C>(
    conn: &WebSocketConnection,
    state: &ServerState<G, C>,
    outbox: &mut Outbox<'_, C>,
) -> Result<PlayerId, CanhuntError>
where
    G: GameLogic,
    C: Codec,
{
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before handshake".into()).into());
        }
        Ok(Err(e)) => return Err(CanhuntError::Transport(e)),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = state.codec.decode(&data)?;

    let (version, name) = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version, name }) => (version, name),
        _ => {
            outbox.error(400, "expected Handshake").await?;
            return Err(ProtocolError::InvalidMessage("first message must be Handshake".into()).into());
        }
    };

    if version != PROTOCOL_VERSION {
        outbox
            .error(400, format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"))
            .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let player_id = PlayerId(state.next_player_id.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(%player_id, name = name.as_deref().unwrap_or("-"), "handshake accepted");

    let server_time = outbox.now_ms();
    outbox
        .system(SystemMessage::HandshakeAck {
            player_id,
            server_time,
        })
        .await?;

    Ok(player_id)
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// The sending half of a connection: stamps envelopes with a sequence
/// number and the time since the connection was accepted.
struct Outbox<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<'a, C: Codec> Outbox<'a, C> {
    fn new(conn: &'a WebSocketConnection, codec: &'a C) -> Self {
        Self {
            conn,
            codec,
            seq: 0,
            start: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn next_seq(&mut self) -> u64 {
        let current = self.seq;
        self.seq += 1;
        current
    }

    async fn system(&mut self, msg: SystemMessage) -> Result<(), CanhuntError> {
        let envelope = Envelope::system(self.next_seq(), self.now_ms(), msg);
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn error(&mut self, code: u16, message: impl Into<String>) -> Result<(), CanhuntError> {
        self.system(SystemMessage::Error {
            code,
            message: message.into(),
        })
        .await
    }

    async fn game<T: Serialize>(&mut self, msg: &T, channel: Channel) -> Result<(), CanhuntError> {
        let data = self.codec.encode(msg)?;
        let envelope = Envelope::game(self.next_seq(), self.now_ms(), channel, data);
        let bytes = self.codec.encode(&envelope)?;
        match channel {
            Channel::Unreliable => self.conn.send_unreliable(&bytes).await?,
            Channel::ReliableOrdered => self.conn.send(&bytes).await?,
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One connected player and the room they are subscribed to.
struct Client<'a, G: GameLogic, C: Codec> {
    state: &'a ServerState<G, C>,
    player_id: PlayerId,
    outbox: Outbox<'a, C>,
    room: Option<(RoomId, RoomReceiver<G>)>,
}

impl<G: GameLogic, C: Codec> Client<'_, G, C> {
    /// Handles a system message. Returns `true` if the connection should close.
    async fn handle_system(&mut self, msg: SystemMessage) -> Result<bool, CanhuntError> {
        let player_id = self.player_id;
        match msg {
            SystemMessage::Heartbeat { client_time } => {
                let server_time = self.outbox.now_ms();
                self.outbox
                    .system(SystemMessage::HeartbeatAck {
                        client_time,
                        server_time,
                    })
                    .await?;
            }

            SystemMessage::StartGame { seed } => {
                let seed = seed.unwrap_or_else(|| rand::rng().random());
                let (tx, rx) = mpsc::unbounded_channel();
                let result = self.state.rooms.lock().await.create_room(
                    player_id,
                    &self.state.game_config,
                    seed,
                    tx,
                );
                match result {
                    Ok(room_id) => self.joined(room_id, Role::Seeker, rx).await?,
                    Err(e) => self.room_error(&e).await?,
                }
            }

            SystemMessage::Spectate { room_id } => {
                let (tx, rx) = mpsc::unbounded_channel();
                // Lock only for the subscribe; released before network I/O.
                let result = {
                    let mut rooms = self.state.rooms.lock().await;
                    rooms.spectate(player_id, room_id, tx).await
                };
                match result {
                    Ok(()) => self.joined(room_id, Role::Spectator, rx).await?,
                    Err(e) => self.room_error(&e).await?,
                }
            }

            SystemMessage::Pause | SystemMessage::Resume => {
                let paused = matches!(msg, SystemMessage::Pause);
                let result = self.state.rooms.lock().await.set_paused(player_id, paused).await;
                if let Err(e) = result {
                    self.room_error(&e).await?;
                }
            }

            SystemMessage::LeaveRoom => {
                let result = self.state.rooms.lock().await.leave_room(player_id).await;
                match result {
                    Ok(room_id) => {
                        self.room = None;
                        self.outbox.system(SystemMessage::RoomClosed { room_id }).await?;
                    }
                    Err(e) => self.room_error(&e).await?,
                }
            }

            SystemMessage::ListRooms => {
                let infos = self.state.rooms.lock().await.list_rooms().await;
                let rooms = infos
                    .into_iter()
                    .map(|info| RoomListEntry {
                        room_id: info.room_id,
                        seeker: info.seeker,
                        spectators: info.spectators,
                        max_spectators: info.max_spectators,
                    })
                    .collect();
                self.outbox.system(SystemMessage::RoomList { rooms }).await?;
            }

            SystemMessage::Disconnect { reason } => {
                tracing::info!(%player_id, %reason, "client disconnected");
                return Ok(true);
            }

            other => {
                tracing::debug!(%player_id, message = ?other, "ignoring unexpected system message");
            }
        }

        Ok(false)
    }

    /// Decodes a game message and routes it to the player's room.
    async fn handle_game(&mut self, data: &[u8]) -> Result<(), CanhuntError> {
        let msg: G::ClientMessage = match self.state.codec.decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                return self.outbox.error(400, format!("invalid game message: {e}")).await;
            }
        };

        let result = self.state.rooms.lock().await.route_message(self.player_id, msg).await;
        if let Err(e) = result {
            self.room_error(&e).await?;
        }
        Ok(())
    }

    /// Forwards one message from the room to the client.
    async fn forward(&mut self, outbound: Option<RoomOutbound<G>>) -> Result<(), CanhuntError> {
        match outbound {
            Some(RoomOutbound::Message(msg, channel)) => self.outbox.game(&msg, channel).await,
            Some(RoomOutbound::Closed(room_id)) => {
                self.room = None;
                tracing::debug!(player_id = %self.player_id, %room_id, "room closed under player");
                self.outbox.system(SystemMessage::RoomClosed { room_id }).await
            }
            None => {
                self.room = None;
                Ok(())
            }
        }
    }

    async fn joined(&mut self, room_id: RoomId, role: Role, rx: RoomReceiver<G>) -> Result<(), CanhuntError> {
        self.room = Some((room_id, rx));
        tracing::info!(player_id = %self.player_id, %room_id, %role, "joined room");
        self.outbox.system(SystemMessage::RoomJoined { room_id, role }).await
    }

    async fn room_error(&mut self, e: &RoomError) -> Result<(), CanhuntError> {
        tracing::debug!(player_id = %self.player_id, error = %e, "room request failed");
        self.outbox.error(room_error_code(e), e.to_string()).await
    }
}

fn room_error_code(e: &RoomError) -> u16 {
    match e {
        RoomError::NotFound(_) => 404,
        RoomError::NotInAnyRoom(_) | RoomError::NotInRoom(..) => 400,
        RoomError::NotSeeker(..) => 403,
        RoomError::AlreadyInRoom(..) | RoomError::SpectatorsFull(_) | RoomError::InvalidState(_) => 409,
        RoomError::GameInit(_) => 500,
        RoomError::Unavailable(_) => 503,
    }
}

/// When a connection silent from now on gets dropped. Timeouts past the
/// end of `Instant` are clamped to a day.
fn idle_deadline(idle: Duration) -> tokio::time::Instant {
    let now = tokio::time::Instant::now();
    now.checked_add(idle)
        .unwrap_or_else(|| now + Duration::from_secs(86_400))
}
