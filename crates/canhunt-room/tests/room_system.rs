//! Integration tests for the room system using a mock game.

use std::time::Duration;

use canhunt_protocol::{Channel, PlayerId, Recipient, RoomId};
use canhunt_room::{GameLogic, RoomConfig, RoomError, RoomManager, RoomOutbound, RoomState};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// =========================================================================
// Mock game: counts frames and echoes bumps.
// =========================================================================

#[derive(Debug)]
struct FrameCounter;

#[derive(Clone, Debug, Default)]
struct CounterConfig {
    refuse: bool,
}

#[derive(Debug)]
struct CounterState {
    frames: u32,
    total: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
enum Bump {
    By(i32),
    Negative,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum CounterEvent {
    View { frames: u32, total: i32 },
    Bumped(i32),
    Tenth,
}

#[derive(Debug, thiserror::Error)]
#[error("refused to start")]
struct Refused;

impl GameLogic for FrameCounter {
    type Config = CounterConfig;
    type State = CounterState;
    type ClientMessage = Bump;
    type ServerMessage = CounterEvent;
    type Error = Refused;

    fn init(config: &CounterConfig, _seeker: PlayerId, seed: u64) -> Result<CounterState, Refused> {
        if config.refuse {
            return Err(Refused);
        }
        Ok(CounterState { frames: 0, total: seed as i32 })
    }

    fn validate_message(_state: &CounterState, _sender: PlayerId, msg: &Bump) -> Result<(), String> {
        match msg {
            Bump::Negative => Err("negative bumps are not allowed".into()),
            Bump::By(_) => Ok(()),
        }
    }

    fn handle_message(state: &mut CounterState, sender: PlayerId, msg: Bump) -> Vec<(Recipient, CounterEvent)> {
        let Bump::By(n) = msg else { return vec![] };
        state.total += n;
        vec![(Recipient::Player(sender), CounterEvent::Bumped(state.total))]
    }

    fn tick(state: &mut CounterState, _dt: Duration) -> Vec<(Recipient, CounterEvent)> {
        state.frames += 1;
        if state.frames % 10 == 0 {
            vec![(Recipient::All, CounterEvent::Tenth)]
        } else {
            vec![]
        }
    }

    fn snapshot(state: &CounterState) -> CounterEvent {
        CounterEvent::View { frames: state.frames, total: state.total }
    }

    fn room_config() -> RoomConfig {
        RoomConfig { max_spectators: 2, ..RoomConfig::default() }
    }
}

// =========================================================================
// Helpers
// =========================================================================

type Rx = mpsc::UnboundedReceiver<RoomOutbound<FrameCounter>>;

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn channel() -> (mpsc::UnboundedSender<RoomOutbound<FrameCounter>>, Rx) {
    mpsc::unbounded_channel()
}

/// Receives until `pred` matches, failing after one simulated minute.
async fn recv_until(rx: &mut Rx, mut pred: impl FnMut(&RoomOutbound<FrameCounter>) -> bool) -> RoomOutbound<FrameCounter> {
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let msg = rx.recv().await.expect("room channel closed early");
            if pred(&msg) {
                return msg;
            }
        }
    })
    .await
    .expect("timed out waiting for room message")
}

fn start(mgr: &mut RoomManager<FrameCounter>, seeker: u64) -> (RoomId, Rx) {
    let (tx, rx) = channel();
    let room = mgr.create_room(pid(seeker), &CounterConfig::default(), 0, tx).expect("room should start");
    (room, rx)
}

// =========================================================================
// Creation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_room_returns_unique_ids() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (r1, _rx1) = start(&mut mgr, 1);
    let (r2, _rx2) = start(&mut mgr, 2);
    assert_ne!(r1, r2);
    assert_eq!(mgr.room_count(), 2);
    assert_eq!(mgr.player_room(&pid(1)), Some(r1));
    assert_eq!(mgr.player_room(&pid(2)), Some(r2));
}

#[tokio::test(start_paused = true)]
async fn test_one_room_per_seeker() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (r1, _rx) = start(&mut mgr, 1);
    let (tx, _rx2) = channel();
    let result = mgr.create_room(pid(1), &CounterConfig::default(), 0, tx);
    assert!(matches!(result, Err(RoomError::AlreadyInRoom(p, r)) if p == pid(1) && r == r1));
    assert_eq!(mgr.room_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_init_failure_creates_nothing() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (tx, _rx) = channel();
    let result = mgr.create_room(pid(1), &CounterConfig { refuse: true }, 0, tx);
    assert!(matches!(result, Err(RoomError::GameInit(_))));
    assert_eq!(mgr.room_count(), 0);
    assert_eq!(mgr.player_room(&pid(1)), None);
}

#[tokio::test(start_paused = true)]
async fn test_seeker_gets_starting_snapshot() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (tx, mut rx) = channel();
    mgr.create_room(pid(1), &CounterConfig::default(), 7, tx).unwrap();

    match rx.recv().await.unwrap() {
        RoomOutbound::Message(CounterEvent::View { frames, total }, Channel::Unreliable) => {
            assert_eq!(frames, 0);
            assert_eq!(total, 7, "seed reaches init");
        }
        other => panic!("expected starting snapshot, got {other:?}"),
    }
}

// =========================================================================
// Frames
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_frames_send_snapshots_and_reliable_events() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, mut rx) = start(&mut mgr, 1);

    let tenth = recv_until(&mut rx, |m| matches!(m, RoomOutbound::Message(CounterEvent::Tenth, _))).await;
    assert!(matches!(tenth, RoomOutbound::Message(_, Channel::ReliableOrdered)));

    // The snapshot for frame 10 follows its events.
    let next = rx.recv().await.unwrap();
    assert!(matches!(
        next,
        RoomOutbound::Message(CounterEvent::View { frames: 10, .. }, Channel::Unreliable)
    ));

    let info = mgr.get_room_info(room).await.unwrap();
    assert!(info.frame >= 10);
    assert_eq!(info.state, RoomState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_frame_rate_follows_room_config() {
    let mut mgr = RoomManager::<FrameCounter>::with_room_config(RoomConfig {
        frame_rate: 20,
        ..RoomConfig::default()
    });
    let (room, _rx) = start(&mut mgr, 1);

    tokio::time::sleep(Duration::from_millis(1_010)).await;
    let info = mgr.get_room_info(room).await.unwrap();
    assert!((19..=20).contains(&info.frame), "got {} frames", info.frame);
}

// =========================================================================
// Messages
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_route_message_reaches_game() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (_room, mut rx) = start(&mut mgr, 1);

    mgr.route_message(pid(1), Bump::By(5)).await.unwrap();
    let reply = recv_until(&mut rx, |m| matches!(m, RoomOutbound::Message(CounterEvent::Bumped(_), _))).await;
    assert!(matches!(reply, RoomOutbound::Message(CounterEvent::Bumped(5), Channel::ReliableOrdered)));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_message_is_dropped() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (_room, mut rx) = start(&mut mgr, 1);

    mgr.route_message(pid(1), Bump::Negative).await.unwrap();
    mgr.route_message(pid(1), Bump::By(2)).await.unwrap();

    // The first reply is for the valid bump; the invalid one left no trace.
    let reply = recv_until(&mut rx, |m| matches!(m, RoomOutbound::Message(CounterEvent::Bumped(_), _))).await;
    assert!(matches!(reply, RoomOutbound::Message(CounterEvent::Bumped(2), _)));
}

#[tokio::test(start_paused = true)]
async fn test_spectator_messages_are_ignored() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, mut seeker_rx) = start(&mut mgr, 1);
    let (tx, mut spec_rx) = channel();
    mgr.spectate(pid(2), room, tx).await.unwrap();

    mgr.route_message(pid(2), Bump::By(100)).await.unwrap();
    mgr.route_message(pid(1), Bump::By(1)).await.unwrap();

    let reply = recv_until(&mut seeker_rx, |m| matches!(m, RoomOutbound::Message(CounterEvent::Bumped(_), _))).await;
    assert!(matches!(reply, RoomOutbound::Message(CounterEvent::Bumped(1), _)));

    let view = recv_until(&mut spec_rx, |m| matches!(m, RoomOutbound::Message(CounterEvent::View { .. }, Channel::Unreliable))).await;
    if let RoomOutbound::Message(CounterEvent::View { total, .. }, _) = view {
        assert!(total <= 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_route_message_not_in_room() {
    let mgr = RoomManager::<FrameCounter>::new();
    let result = mgr.route_message(pid(1), Bump::By(1)).await;
    assert!(matches!(result, Err(RoomError::NotInAnyRoom(_))));
}

// =========================================================================
// Spectators
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_spectator_gets_snapshot_then_frames() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, _seeker_rx) = start(&mut mgr, 1);
    let (tx, mut rx) = channel();
    mgr.spectate(pid(2), room, tx).await.unwrap();

    // The catch-up snapshot on join is reliable.
    let first = rx.recv().await.unwrap();
    assert!(matches!(first, RoomOutbound::Message(CounterEvent::View { .. }, Channel::ReliableOrdered)));

    recv_until(&mut rx, |m| matches!(m, RoomOutbound::Message(CounterEvent::Tenth, _))).await;
    assert_eq!(mgr.player_room(&pid(2)), Some(room));
    assert_eq!(mgr.get_room_info(room).await.unwrap().spectators, 1);
}

#[tokio::test(start_paused = true)]
async fn test_spectate_full_room() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, _rx) = start(&mut mgr, 1);
    let (tx2, _rx2) = channel();
    let (tx3, _rx3) = channel();
    let (tx4, _rx4) = channel();
    mgr.spectate(pid(2), room, tx2).await.unwrap();
    mgr.spectate(pid(3), room, tx3).await.unwrap();

    let result = mgr.spectate(pid(4), room, tx4).await;
    assert!(matches!(result, Err(RoomError::SpectatorsFull(r)) if r == room));
    assert_eq!(mgr.player_room(&pid(4)), None);
}

#[tokio::test(start_paused = true)]
async fn test_spectate_disabled() {
    let mut mgr = RoomManager::<FrameCounter>::with_room_config(RoomConfig {
        allow_spectators: false,
        ..RoomConfig::default()
    });
    let (room, _rx) = start(&mut mgr, 1);
    let (tx, _rx2) = channel();
    assert!(matches!(mgr.spectate(pid(2), room, tx).await, Err(RoomError::SpectatorsFull(_))));
}

#[tokio::test(start_paused = true)]
async fn test_spectate_unknown_room() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (tx, _rx) = channel();
    let result = mgr.spectate(pid(2), RoomId(999_999), tx).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_seeker_cannot_spectate_elsewhere() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (_r1, _rx1) = start(&mut mgr, 1);
    let (r2, _rx2) = start(&mut mgr, 2);
    let (tx, _rx) = channel();
    assert!(matches!(mgr.spectate(pid(1), r2, tx).await, Err(RoomError::AlreadyInRoom(_, _))));
}

// =========================================================================
// Pause / resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_stops_frames_and_resume_restarts() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, _rx) = start(&mut mgr, 1);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(mgr.set_paused(pid(1), true).await.unwrap(), RoomState::Paused);
    let frozen = mgr.get_room_info(room).await.unwrap();
    assert_eq!(frozen.state, RoomState::Paused);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(mgr.get_room_info(room).await.unwrap().frame, frozen.frame);

    assert_eq!(mgr.set_paused(pid(1), false).await.unwrap(), RoomState::Running);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(mgr.get_room_info(room).await.unwrap().frame > frozen.frame);
}

#[tokio::test(start_paused = true)]
async fn test_pause_twice_is_harmless() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (_room, _rx) = start(&mut mgr, 1);
    mgr.set_paused(pid(1), true).await.unwrap();
    assert_eq!(mgr.set_paused(pid(1), true).await.unwrap(), RoomState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_spectator_cannot_pause() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, _rx) = start(&mut mgr, 1);
    let (tx, _rx2) = channel();
    mgr.spectate(pid(2), room, tx).await.unwrap();

    let result = mgr.set_paused(pid(2), true).await;
    assert!(matches!(result, Err(RoomError::NotSeeker(p, _)) if p == pid(2)));
}

// =========================================================================
// Leaving and closing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_spectator_leave_keeps_room() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, _rx) = start(&mut mgr, 1);
    let (tx, _rx2) = channel();
    mgr.spectate(pid(2), room, tx).await.unwrap();

    assert_eq!(mgr.leave_room(pid(2)).await.unwrap(), room);
    assert_eq!(mgr.player_room(&pid(2)), None);
    assert_eq!(mgr.room_count(), 1);
    assert_eq!(mgr.get_room_info(room).await.unwrap().spectators, 0);
}

#[tokio::test(start_paused = true)]
async fn test_seeker_leave_closes_room() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, _rx) = start(&mut mgr, 1);
    let (tx, mut spec_rx) = channel();
    mgr.spectate(pid(2), room, tx).await.unwrap();

    mgr.leave_room(pid(1)).await.unwrap();

    assert_eq!(mgr.room_count(), 0);
    assert_eq!(mgr.player_room(&pid(1)), None);
    assert_eq!(mgr.player_room(&pid(2)), None, "spectators leave with the room");

    let closed = recv_until(&mut spec_rx, |m| matches!(m, RoomOutbound::Closed(_))).await;
    assert!(matches!(closed, RoomOutbound::Closed(r) if r == room));
    assert!(mgr.get_room_info(room).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_leave_room_not_in_any_room() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    assert!(matches!(mgr.leave_room(pid(1)).await, Err(RoomError::NotInAnyRoom(_))));
}

#[tokio::test(start_paused = true)]
async fn test_room_stops_when_seeker_channel_drops() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, rx) = start(&mut mgr, 1);
    drop(rx);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(matches!(mgr.get_room_info(room).await, Err(RoomError::Unavailable(_))));

    // Leaving a dead room still clears the index.
    mgr.leave_room(pid(1)).await.unwrap();
    assert_eq!(mgr.room_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_room() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (room, mut rx) = start(&mut mgr, 1);

    mgr.destroy_room(room).await.unwrap();

    assert_eq!(mgr.room_count(), 0);
    assert_eq!(mgr.player_room(&pid(1)), None);
    recv_until(&mut rx, |m| matches!(m, RoomOutbound::Closed(_))).await;
}

#[tokio::test(start_paused = true)]
async fn test_destroy_room_not_found() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    assert!(mgr.destroy_room(RoomId(999_999)).await.is_err());
}

// =========================================================================
// Listing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_list_rooms_empty() {
    let mgr = RoomManager::<FrameCounter>::new();
    assert!(mgr.list_rooms().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_list_rooms_skips_full_rooms() {
    let mut mgr = RoomManager::<FrameCounter>::new();
    let (r1, _rx1) = start(&mut mgr, 1);
    let (r2, _rx2) = start(&mut mgr, 2);
    let (tx3, _rx3) = channel();
    let (tx4, _rx4) = channel();
    mgr.spectate(pid(3), r2, tx3).await.unwrap();
    mgr.spectate(pid(4), r2, tx4).await.unwrap();

    let rooms = mgr.list_rooms().await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_id, r1);
    assert_eq!(rooms[0].seeker, pid(1));
}
