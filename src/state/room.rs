use std::{collections::VecDeque, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, broadcast},
    task::JoinHandle,
};
use tracing::warn;

use crate::{
    dto::{game::GameStateDto, sse::ServerEvent, ws::ServerMessage},
    state::game::GameState,
};

/// Event name carried on every snapshot fan-out.
pub const EVENT_STATE: &str = "state";

/// Broadcast hub fanning room events out to WebSocket forwarders and SSE
/// streams. Sends are fire-and-forget; a slow or gone subscriber never
/// blocks the broadcaster.
pub struct RoomHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl RoomHub {
    /// Construct a hub backed by a Tokio broadcast channel.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// One match room: the authoritative game state, its subscriber hub, the
/// undo history, and the debounce timer that coalesces broadcasts.
///
/// Rooms are fully independent; each carries its own locks and timer so
/// there is no cross-room coordination of any kind.
pub struct Room {
    id: String,
    state: Mutex<Option<GameState>>,
    history: Mutex<VecDeque<GameState>>,
    hub: RoomHub,
    debounce: Mutex<Option<JoinHandle<()>>>,
}

impl Room {
    /// Create an uninitialized room; state appears with the first control
    /// mutation (or by hydration from the snapshot store).
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            state: Mutex::new(None),
            history: Mutex::new(VecDeque::new()),
            hub: RoomHub::new(16),
            debounce: Mutex::new(None),
        })
    }

    /// Room code.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Authoritative state slot. `None` means the room is uninitialized.
    pub fn state(&self) -> &Mutex<Option<GameState>> {
        &self.state
    }

    /// Subscriber hub for this room.
    pub fn hub(&self) -> &RoomHub {
        &self.hub
    }

    /// Snapshot the current state as a wire DTO.
    pub async fn snapshot_dto(&self) -> Option<GameStateDto> {
        let guard = self.state.lock().await;
        guard.as_ref().map(GameStateDto::from)
    }

    /// Push a pre-mutation snapshot onto the bounded undo history.
    pub async fn push_history(&self, previous: GameState, capacity: usize) {
        if capacity == 0 {
            return;
        }
        let mut history = self.history.lock().await;
        if history.len() == capacity {
            history.pop_front();
        }
        history.push_back(previous);
    }

    /// Pop the most recent history snapshot, if any.
    pub async fn pop_history(&self) -> Option<GameState> {
        let mut history = self.history.lock().await;
        history.pop_back()
    }

    /// Schedule a debounced broadcast of the current state.
    ///
    /// Trailing edge, single-shot per room: a mutation arriving while a
    /// timer is pending aborts it and starts a fresh one, so rapid control
    /// input coalesces into one fan-out carrying the final value. The state
    /// is read when the timer fires, not when it is armed.
    pub async fn schedule_broadcast(self: &Arc<Self>, window: Duration) {
        let mut pending = self.debounce.lock().await;
        if let Some(timer) = pending.take() {
            timer.abort();
        }
        let room = Arc::clone(self);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            room.broadcast_now().await;
        }));
    }

    /// Fan the current snapshot out to every subscriber immediately.
    pub async fn broadcast_now(&self) {
        let message = ServerMessage::State {
            game_id: self.id.clone(),
            state: self.snapshot_dto().await,
        };
        match ServerEvent::json(Some(EVENT_STATE.to_string()), &message) {
            Ok(event) => self.hub.broadcast(event),
            Err(err) => warn!(room_id = %self.id, error = %err, "failed to serialize snapshot broadcast"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Seat;

    const WINDOW: Duration = Duration::from_millis(100);

    async fn install_state(room: &Arc<Room>) {
        let mut guard = room.state().lock().await;
        *guard = Some(GameState::new_match());
    }

    fn east_score(event: &ServerEvent) -> i64 {
        let value: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        value["state"]["players"][0]["score"].as_i64().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_mutations_coalesce_into_one_broadcast() {
        let room = Room::new("123456");
        let mut receiver = room.hub().subscribe();
        install_state(&room).await;

        room.schedule_broadcast(WINDOW).await;
        {
            let mut guard = room.state().lock().await;
            guard.as_mut().unwrap().set_score(Seat::East, 30000);
        }
        room.schedule_broadcast(WINDOW).await;

        tokio::time::sleep(WINDOW * 3).await;

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_STATE));
        // Only the second mutation's value ever goes out.
        assert_eq!(east_score(&event), 30000);
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn separated_mutations_broadcast_separately() {
        let room = Room::new("123456");
        let mut receiver = room.hub().subscribe();
        install_state(&room).await;

        room.schedule_broadcast(WINDOW).await;
        tokio::time::sleep(WINDOW * 2).await;

        {
            let mut guard = room.state().lock().await;
            guard.as_mut().unwrap().set_score(Seat::East, 26000);
        }
        room.schedule_broadcast(WINDOW).await;
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(east_score(&receiver.recv().await.unwrap()), 25000);
        assert_eq!(east_score(&receiver.recv().await.unwrap()), 26000);
    }

    #[tokio::test]
    async fn history_is_a_bounded_ring() {
        let room = Room::new("000001");
        for score in 0..5 {
            let mut state = GameState::new_match();
            state.set_score(Seat::East, score);
            room.push_history(state, 3).await;
        }
        // Oldest entries fell off; the last three remain, newest first out.
        let newest = room.pop_history().await.unwrap();
        assert_eq!(newest.player(Seat::East).score, 4);
        room.pop_history().await.unwrap();
        room.pop_history().await.unwrap();
        assert!(room.pop_history().await.is_none());
    }

    #[tokio::test]
    async fn uninitialized_room_broadcasts_null_state() {
        let room = Room::new("999999");
        let mut receiver = room.hub().subscribe();
        room.broadcast_now().await;
        let event = receiver.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert!(value["state"].is_null());
    }
}
