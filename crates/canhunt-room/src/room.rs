//! Room actor: an isolated Tokio task that owns one running game.
//!
//! The actor waits on two things at once: commands from the outside world
//! (spectate, leave, input, pause) and the next frame from its
//! [`FrameClock`]. No state is shared; everything goes through the
//! command channel.

use std::collections::HashMap;

use canhunt_protocol::{Channel, PlayerId, Recipient, Role, RoomId};
use canhunt_tick::{FrameClock, FrameConfig};
use tokio::sync::{mpsc, oneshot};

use crate::{GameLogic, RoomConfig, RoomError, RoomState};

/// What a room sends to a subscriber's connection handler.
#[derive(Debug)]
pub enum RoomOutbound<G: GameLogic> {
    /// A game message and the channel it should travel on.
    Message(G::ServerMessage, Channel),
    /// The room has closed; the subscriber is no longer in it.
    Closed(RoomId),
}

impl<G: GameLogic> Clone for RoomOutbound<G> {
    fn clone(&self) -> Self {
        match self {
            Self::Message(m, c) => Self::Message(m.clone(), *c),
            Self::Closed(r) => Self::Closed(*r),
        }
    }
}

/// Channel sender for delivering outbound messages to a player.
pub type PlayerSender<G> = mpsc::UnboundedSender<RoomOutbound<G>>;

pub(crate) enum RoomCommand<G: GameLogic> {
    Spectate {
        player_id: PlayerId,
        sender: PlayerSender<G>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Reply carries the role the player had, so the caller knows whether
    /// the room is about to close.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<Role, RoomError>>,
    },

    Message {
        sender: PlayerId,
        msg: G::ClientMessage,
    },

    SetPaused {
        player_id: PlayerId,
        paused: bool,
        reply: oneshot::Sender<Result<RoomState, RoomError>>,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// Room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub seeker: PlayerId,
    pub state: RoomState,
    pub spectators: usize,
    pub max_spectators: usize,
    /// Frames simulated so far.
    pub frame: u64,
    pub allow_spectators: bool,
}

impl RoomInfo {
    /// Open, and with room for one more spectator.
    pub fn is_spectatable(&self) -> bool {
        self.state.is_open()
            && self.allow_spectators
            && (self.max_spectators == 0 || self.spectators < self.max_spectators)
    }
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle<G: GameLogic> {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand<G>>,
}

impl<G: GameLogic> RoomHandle<G> {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// `true` once the actor task has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        cmd: RoomCommand<G>,
        reply: oneshot::Receiver<T>,
    ) -> Result<T, RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply.await.map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Subscribes `player_id` to the room's snapshots and events.
    pub async fn spectate(
        &self,
        player_id: PlayerId,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Spectate { player_id, sender, reply }, rx)
            .await?
    }

    /// Removes a player. If it was the seeker, the room closes.
    pub async fn leave(&self, player_id: PlayerId) -> Result<Role, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Leave { player_id, reply }, rx).await?
    }

    /// Sends a game message to the room (fire-and-forget).
    pub async fn send_message(
        &self,
        sender: PlayerId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message { sender, msg })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Pauses or resumes the frame clock. Only the seeker may do this.
    pub async fn set_paused(
        &self,
        player_id: PlayerId,
        paused: bool,
    ) -> Result<RoomState, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::SetPaused { player_id, paused, reply }, rx)
            .await?
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::GetInfo { reply }, rx).await
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

struct RoomActor<G: GameLogic> {
    room_id: RoomId,
    state: RoomState,
    config: RoomConfig,
    seeker: PlayerId,
    seeker_tx: PlayerSender<G>,
    spectators: HashMap<PlayerId, PlayerSender<G>>,
    game: G::State,
    clock: FrameClock,
    receiver: mpsc::Receiver<RoomCommand<G>>,
}

/// Whether the actor loop keeps going after a command.
enum Flow {
    Continue,
    Stop,
}

impl<G: GameLogic> RoomActor<G> {
    async fn run(mut self) {
        tracing::info!(
            room_id = %self.room_id,
            seeker = %self.seeker,
            rate_hz = self.clock.frame_rate_hz(),
            "room actor started"
        );

        // The seeker sees the starting layout before the first frame.
        self.send_snapshot();

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::debug!(room_id = %self.room_id, "all handles dropped");
                        break;
                    };
                    if let Flow::Stop = self.handle_command(cmd) {
                        break;
                    }
                }
                frame = self.clock.wait_for_frame() => {
                    let msgs = G::tick(&mut self.game, frame.dt);
                    self.dispatch(msgs, Channel::ReliableOrdered);
                    if frame.frame % u64::from(self.config.snapshot_every.max(1)) == 0 {
                        self.send_snapshot();
                    }
                    self.clock.record_frame_end();

                    if self.seeker_tx.is_closed() {
                        tracing::info!(room_id = %self.room_id, "seeker connection gone");
                        break;
                    }
                }
            }
        }

        self.close();
        tracing::info!(
            room_id = %self.room_id,
            frames = self.clock.frame_count(),
            "room actor stopped"
        );
    }

    fn handle_command(&mut self, cmd: RoomCommand<G>) -> Flow {
        match cmd {
            RoomCommand::Spectate { player_id, sender, reply } => {
                let _ = reply.send(self.handle_spectate(player_id, sender));
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.handle_leave(player_id);
                let seeker_left = matches!(result, Ok(Role::Seeker));
                let _ = reply.send(result);
                if seeker_left {
                    return Flow::Stop;
                }
            }
            RoomCommand::Message { sender, msg } => self.handle_message(sender, msg),
            RoomCommand::SetPaused { player_id, paused, reply } => {
                let _ = reply.send(self.handle_set_paused(player_id, paused));
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room_id, "room shutting down");
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn handle_spectate(
        &mut self,
        player_id: PlayerId,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        if player_id == self.seeker || self.spectators.contains_key(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.room_id));
        }
        if !self.config.has_spectator_slot(self.spectators.len()) {
            return Err(RoomError::SpectatorsFull(self.room_id));
        }

        let _ = sender.send(RoomOutbound::Message(G::snapshot(&self.game), Channel::ReliableOrdered));
        self.spectators.insert(player_id, sender);
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            spectators = self.spectators.len(),
            "spectator joined"
        );
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<Role, RoomError> {
        if player_id == self.seeker {
            tracing::info!(room_id = %self.room_id, %player_id, "seeker left");
            return Ok(Role::Seeker);
        }
        if self.spectators.remove(&player_id).is_none() {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        }
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            spectators = self.spectators.len(),
            "spectator left"
        );
        Ok(Role::Spectator)
    }

    fn handle_message(&mut self, sender: PlayerId, msg: G::ClientMessage) {
        if sender != self.seeker {
            tracing::warn!(room_id = %self.room_id, %sender, "game message from non-seeker, ignoring");
            return;
        }

        if let Err(reason) = G::validate_message(&self.game, sender, &msg) {
            tracing::debug!(
                room_id = %self.room_id,
                %sender,
                %reason,
                "message validation failed"
            );
            return;
        }

        let msgs = G::handle_message(&mut self.game, sender, msg);
        self.dispatch(msgs, Channel::ReliableOrdered);
    }

    fn handle_set_paused(&mut self, player_id: PlayerId, paused: bool) -> Result<RoomState, RoomError> {
        if player_id != self.seeker {
            return Err(RoomError::NotSeeker(player_id, self.room_id));
        }
        let target = if paused { RoomState::Paused } else { RoomState::Running };
        if self.state == target {
            return Ok(self.state);
        }
        if !self.state.can_transition_to(target) {
            return Err(RoomError::InvalidState(format!(
                "cannot go from {} to {}",
                self.state, target
            )));
        }

        if paused {
            self.clock.pause();
        } else {
            self.clock.resume();
        }
        self.state = target;
        tracing::info!(room_id = %self.room_id, state = %self.state, "room state changed");
        Ok(self.state)
    }

    fn send_snapshot(&self) {
        let snapshot = G::snapshot(&self.game);
        self.dispatch(vec![(Recipient::All, snapshot)], Channel::Unreliable);
    }

    /// Delivers messages to their recipients on `channel`.
    fn dispatch(&self, msgs: Vec<(Recipient, G::ServerMessage)>, channel: Channel) {
        for (recipient, msg) in msgs {
            let outbound = RoomOutbound::Message(msg, channel);
            match recipient {
                Recipient::All => {
                    let _ = self.seeker_tx.send(outbound.clone());
                    for tx in self.spectators.values() {
                        let _ = tx.send(outbound.clone());
                    }
                }
                Recipient::Player(pid) => self.send_to(pid, outbound),
                Recipient::Spectators => {
                    for tx in self.spectators.values() {
                        let _ = tx.send(outbound.clone());
                    }
                }
            }
        }
    }

    /// Silently drops if the receiver is gone.
    fn send_to(&self, player_id: PlayerId, msg: RoomOutbound<G>) {
        if player_id == self.seeker {
            let _ = self.seeker_tx.send(msg);
        } else if let Some(tx) = self.spectators.get(&player_id) {
            let _ = tx.send(msg);
        }
    }

    fn close(&mut self) {
        self.state = RoomState::Closed;
        let closed = RoomOutbound::Closed(self.room_id);
        let _ = self.seeker_tx.send(closed.clone());
        for (_, tx) in self.spectators.drain() {
            let _ = tx.send(closed.clone());
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            seeker: self.seeker,
            state: self.state,
            spectators: self.spectators.len(),
            max_spectators: self.config.max_spectators,
            frame: self.clock.frame_count(),
            allow_spectators: self.config.allow_spectators,
        }
    }
}

/// Spawns a room actor around an already-initialised game and returns a
/// handle to it. The room starts `Running`.
pub(crate) fn spawn_room<G: GameLogic>(
    room_id: RoomId,
    config: RoomConfig,
    seeker: PlayerId,
    seeker_tx: PlayerSender<G>,
    game: G::State,
) -> RoomHandle<G> {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let clock = FrameClock::new(FrameConfig::with_rate(config.frame_rate));

    let actor = RoomActor::<G> {
        room_id,
        state: RoomState::Running,
        config,
        seeker,
        seeker_tx,
        spectators: HashMap::new(),
        game,
        clock,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
