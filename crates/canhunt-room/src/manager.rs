//! Room manager: creates, tracks, and routes players to rooms.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use canhunt_protocol::{PlayerId, Role, RoomId};

use crate::room::spawn_room;
use crate::{GameLogic, PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo, RoomState};

static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Tracks every running room and which player is in which.
///
/// A player is in at most one room at a time, either as the seeker who
/// started it or as a spectator.
pub struct RoomManager<G: GameLogic> {
    rooms: HashMap<RoomId, RoomHandle<G>>,
    player_rooms: HashMap<PlayerId, RoomId>,
    room_config: RoomConfig,
}

impl<G: GameLogic> RoomManager<G> {
    /// Creates a manager whose rooms use `G::room_config()`.
    pub fn new() -> Self {
        Self::with_room_config(G::room_config())
    }

    pub fn with_room_config(room_config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            room_config,
        }
    }

    pub fn room_config(&self) -> &RoomConfig {
        &self.room_config
    }

    /// Starts a new game owned by `seeker` and returns the room's ID.
    ///
    /// The game is initialised here, so a bad config fails the call
    /// instead of leaving a dead room behind.
    pub fn create_room(
        &mut self,
        seeker: PlayerId,
        game_config: &G::Config,
        seed: u64,
        sender: PlayerSender<G>,
    ) -> Result<RoomId, RoomError> {
        if let Some(current) = self.player_rooms.get(&seeker) {
            return Err(RoomError::AlreadyInRoom(seeker, *current));
        }

        let game = G::init(game_config, seeker, seed).map_err(|e| RoomError::GameInit(e.to_string()))?;
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room::<G>(room_id, self.room_config.clone(), seeker, sender, game);

        self.rooms.insert(room_id, handle);
        self.player_rooms.insert(seeker, room_id);
        tracing::info!(%room_id, %seeker, seed, "room created");
        Ok(room_id)
    }

    /// Subscribes `player_id` to another player's game.
    pub async fn spectate(
        &mut self,
        player_id: PlayerId,
        room_id: RoomId,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, *current));
        }

        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.spectate(player_id, sender).await?;
        self.player_rooms.insert(player_id, room_id);
        Ok(())
    }

    /// Removes a player from their current room and returns that room's
    /// ID. When the seeker leaves, the room closes and every spectator is
    /// dropped from the index too.
    pub async fn leave_room(&mut self, player_id: PlayerId) -> Result<RoomId, RoomError> {
        let room_id = self
            .player_rooms
            .get(&player_id)
            .copied()
            .ok_or(RoomError::NotInAnyRoom(player_id))?;

        let role = match self.rooms.get(&room_id) {
            Some(handle) => match handle.leave(player_id).await {
                Ok(role) => role,
                // The actor already stopped; treat the room as gone.
                Err(RoomError::Unavailable(_)) => Role::Seeker,
                Err(e) => return Err(e),
            },
            None => Role::Spectator,
        };

        self.player_rooms.remove(&player_id);
        if role == Role::Seeker {
            self.rooms.remove(&room_id);
            self.player_rooms.retain(|_, rid| *rid != room_id);
            tracing::info!(%room_id, "room closed by seeker");
        }
        Ok(room_id)
    }

    /// Routes a game message from a player to their current room.
    pub async fn route_message(
        &self,
        player_id: PlayerId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        let handle = self.handle_for(player_id)?;
        handle.send_message(player_id, msg).await
    }

    /// Pauses or resumes the player's room. Only its seeker may.
    pub async fn set_paused(&self, player_id: PlayerId, paused: bool) -> Result<RoomState, RoomError> {
        let handle = self.handle_for(player_id)?;
        handle.set_paused(player_id, paused).await
    }

    pub async fn get_room_info(&self, room_id: RoomId) -> Result<RoomInfo, RoomError> {
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.get_info().await
    }

    /// Lists rooms that would accept one more spectator, ordered by ID.
    /// Rooms that fail to answer are skipped.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                if info.is_spectatable() {
                    infos.push(info);
                }
            }
        }
        infos.sort_by_key(|info| info.room_id.0);
        infos
    }

    /// Shuts down a room and removes all its players from the index.
    pub async fn destroy_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self.rooms.remove(&room_id).ok_or(RoomError::NotFound(room_id))?;
        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, rid| *rid != room_id);
        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    pub fn player_room(&self, player_id: &PlayerId) -> Option<RoomId> {
        self.player_rooms.get(player_id).copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn handle_for(&self, player_id: PlayerId) -> Result<&RoomHandle<G>, RoomError> {
        let room_id = self
            .player_rooms
            .get(&player_id)
            .ok_or(RoomError::NotInAnyRoom(player_id))?;
        self.rooms.get(room_id).ok_or(RoomError::NotFound(*room_id))
    }
}

impl<G: GameLogic> Default for RoomManager<G> {
    fn default() -> Self {
        Self::new()
    }
}
