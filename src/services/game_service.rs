//! Business logic for the authoritative mutation path: room creation,
//! hydration from storage, command application, persistence, and the
//! debounced broadcast hand-off. Mutations for one room are serialized by
//! the room's state lock; across rooms there is no coordination at all.

use std::sync::Arc;

use rand::Rng;
use tracing::{error, info, warn};

use crate::{
    dao::models::GameStateEntity,
    dto::{
        game::CreateRoomResponse,
        ws::{ConnectionRole, GameCommand},
    },
    error::ServiceError,
    scoring::HandOutcome,
    state::{
        SharedState,
        game::{GameState, SCORE_POOL},
        room::Room,
    },
};

const MAX_ROOM_CODE_ATTEMPTS: u32 = 32;

/// Allocate an unused 6-digit room code and register the (still
/// uninitialized) room. State is only created by the first control mutation.
pub async fn create_room(state: &SharedState) -> Result<CreateRoomResponse, ServiceError> {
    let store = state.snapshot_store().await;

    for _ in 0..MAX_ROOM_CODE_ATTEMPTS {
        let code = generate_room_code();
        if state.room(&code).is_some() {
            continue;
        }
        if let Some(store) = &store {
            match store.find_state(code.clone()).await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                // Degraded lookups accept the (tiny) collision risk rather
                // than blocking room creation on storage.
                Err(err) => warn!(error = %err, "room-code uniqueness check skipped"),
            }
        }

        state.room_entry(&code);
        info!(room_id = %code, "room created");
        return Ok(CreateRoomResponse { game_id: code });
    }

    Err(ServiceError::InvalidState(
        "could not allocate an unused room code".into(),
    ))
}

/// Load the persisted snapshot into an uninitialized room, if one exists.
///
/// This is the reconciliation path for freshly-joined or reconnecting
/// clients after a backend restart: live memory wins, storage fills the gap.
pub async fn hydrate_room(state: &SharedState, room: &Arc<Room>) {
    {
        let guard = room.state().lock().await;
        if guard.is_some() {
            return;
        }
    }

    let Some(store) = state.snapshot_store().await else {
        return;
    };
    match store.find_state(room.id().to_string()).await {
        Ok(Some(entity)) => {
            let mut guard = room.state().lock().await;
            // Re-check: a mutation may have created state while we read.
            if guard.is_none() {
                info!(room_id = %room.id(), "hydrated room state from storage");
                *guard = Some(entity.into());
            }
        }
        Ok(None) => {}
        Err(err) => warn!(room_id = %room.id(), error = %err, "failed to hydrate room from storage"),
    }
}

/// Apply one control command to a room.
///
/// Only control connections may mutate; everything else is rejected up
/// front. On success the new state is persisted (best effort) and a
/// debounced broadcast is scheduled. Validation failures reject before any
/// state moves.
pub async fn apply_command(
    state: &SharedState,
    room: &Arc<Room>,
    role: ConnectionRole,
    command: GameCommand,
) -> Result<(), ServiceError> {
    if role != ConnectionRole::Control {
        return Err(ServiceError::Unauthorized(
            "read-only clients cannot update game state".into(),
        ));
    }

    hydrate_room(state, room).await;

    let entity = {
        let mut guard = room.state().lock().await;
        match command {
            GameCommand::Undo => {
                let previous = room.pop_history().await.ok_or_else(|| {
                    ServiceError::InvalidState("no operation left to undo".into())
                })?;
                *guard = Some(previous);
            }
            command => {
                let current = guard.get_or_insert_with(GameState::new_match);
                let before = current.clone();
                apply_to_state(current, command)?;
                room.push_history(before, state.config().history_capacity())
                    .await;
            }
        }

        let current = guard.as_ref().expect("state exists after a mutation");
        audit_pool(room.id(), current);
        GameStateEntity::from(current)
    };

    persist_snapshot(state, room.id(), entity).await;
    room.schedule_broadcast(state.config().broadcast_debounce())
        .await;
    Ok(())
}

/// Apply a single command to the in-memory state. Each arm either completes
/// fully or leaves the state untouched.
fn apply_to_state(state: &mut GameState, command: GameCommand) -> Result<(), ServiceError> {
    match command {
        GameCommand::DeclareRiichi { seat } => state.declare_riichi(seat)?,
        GameCommand::CancelRiichi { seat } => state.cancel_riichi(seat)?,
        GameCommand::ConfirmRiichi { seat } => state.confirm_riichi(seat)?,
        GameCommand::ApplyWin { outcome } => state.apply_outcome(&outcome.into())?,
        GameCommand::ApplyDraw { tenpai_seats } => state.apply_outcome(&HandOutcome::Draw {
            tenpai: tenpai_seats,
        })?,
        GameCommand::SetDora { tiles } => state.set_dora(tiles),
        GameCommand::SetScore { seat, score } => state.set_score(seat, score),
        GameCommand::AdvanceRound => state.advance_round(),
        GameCommand::RetreatRound => state.retreat_round(),
        GameCommand::SetPlayerName { seat, name } => {
            if name.trim().is_empty() {
                return Err(ServiceError::InvalidInput(
                    "player name must not be empty".into(),
                ));
            }
            state.set_player_name(seat, name);
        }
        GameCommand::SetMatchTitle { title } => state.set_match_title(title),
        GameCommand::SetState { state: dto } => *state = GameState::try_from(dto)?,
        GameCommand::Undo => unreachable!("undo is handled by the caller"),
    }
    Ok(())
}

/// Loud post-computation invariant check. A violation is an internal defect;
/// the state is still published because keeping overlays live outranks
/// silently correcting the numbers.
fn audit_pool(room_id: &str, state: &GameState) {
    let total = state.pool_total();
    if total != SCORE_POOL {
        error!(
            room_id,
            total, "score pool invariant violated; publishing state anyway"
        );
    }
}

/// Best-effort snapshot persistence. A storage failure is surfaced as a
/// warning and never rolls back the in-memory mutation: connected clients
/// are about to receive exactly this state.
async fn persist_snapshot(state: &SharedState, room_id: &str, entity: GameStateEntity) {
    let Some(store) = state.snapshot_store().await else {
        warn!(room_id, "no storage backend; snapshot not persisted");
        return;
    };
    if let Err(err) = store.save_state(room_id.to_string(), entity).await {
        warn!(room_id, error = %err, "failed to persist snapshot; broadcast proceeds");
    }
}

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(0..=999_999u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, sync::Mutex as StdMutex};

    use futures::future::BoxFuture;

    use crate::{
        config::AppConfig,
        dao::{snapshot_store::SnapshotStore, storage::StorageResult},
        dto::{game::GameStateDto, ws::WinOutcomeDto},
        scoring::Seat,
        services::auth_service::SharedKeyAuthorizer,
        state::AppState,
    };

    /// In-memory store standing in for the external collaborator.
    #[derive(Default)]
    struct MemoryStore {
        states: StdMutex<HashMap<String, GameStateEntity>>,
    }

    impl SnapshotStore for Arc<MemoryStore> {
        fn save_state(
            &self,
            room_id: String,
            state: GameStateEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            let store = Arc::clone(self);
            Box::pin(async move {
                store.states.lock().unwrap().insert(room_id, state);
                Ok(())
            })
        }

        fn find_state(
            &self,
            room_id: String,
        ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
            let store = Arc::clone(self);
            Box::pin(async move { Ok(store.states.lock().unwrap().get(&room_id).cloned()) })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn app_state() -> (SharedState, Arc<MemoryStore>) {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(SharedKeyAuthorizer::new("key")),
        );
        let store = Arc::new(MemoryStore::default());
        (state, store)
    }

    async fn install_store(state: &SharedState, store: &Arc<MemoryStore>) {
        state.set_snapshot_store(Arc::new(Arc::clone(store))).await;
    }

    #[tokio::test]
    async fn display_role_is_always_rejected() {
        let (state, _) = app_state();
        let room = state.room_entry("123456");

        let result = apply_command(
            &state,
            &room,
            ConnectionRole::Display,
            GameCommand::SetScore {
                seat: Seat::East,
                score: 0,
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
        assert!(room.state().lock().await.is_none());
    }

    #[tokio::test]
    async fn first_control_mutation_creates_and_persists_state() {
        let (state, store) = app_state();
        install_store(&state, &store).await;
        let room = state.room_entry("123456");

        apply_command(
            &state,
            &room,
            ConnectionRole::Control,
            GameCommand::SetDora {
                tiles: vec!["p7".into()],
            },
        )
        .await
        .unwrap();

        let guard = room.state().lock().await;
        let game = guard.as_ref().unwrap();
        assert_eq!(game.dora_indicators, vec!["p7".to_string()]);
        assert_eq!(game.pool_total(), SCORE_POOL);
        drop(guard);

        let persisted = store.states.lock().unwrap();
        assert!(persisted.contains_key("123456"));
    }

    #[tokio::test]
    async fn invalid_outcome_is_rejected_without_partial_application() {
        let (state, _) = app_state();
        let room = state.room_entry("123456");

        // Initialize with a known state first.
        apply_command(
            &state,
            &room,
            ConnectionRole::Control,
            GameCommand::AdvanceRound,
        )
        .await
        .unwrap();

        let result = apply_command(
            &state,
            &room,
            ConnectionRole::Control,
            GameCommand::ApplyWin {
                outcome: WinOutcomeDto::Ron {
                    winner: Seat::East,
                    loser: Seat::East,
                    han: 2,
                    fu: 30,
                },
            },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));

        let guard = room.state().lock().await;
        let game = guard.as_ref().unwrap();
        assert!(game.players.iter().all(|p| p.score == 25000));
    }

    #[tokio::test]
    async fn undo_restores_the_previous_snapshot() {
        let (state, _) = app_state();
        let room = state.room_entry("123456");

        apply_command(
            &state,
            &room,
            ConnectionRole::Control,
            GameCommand::SetScore {
                seat: Seat::West,
                score: 30000,
            },
        )
        .await
        .unwrap();
        apply_command(&state, &room, ConnectionRole::Control, GameCommand::Undo)
            .await
            .unwrap();

        let guard = room.state().lock().await;
        assert_eq!(guard.as_ref().unwrap().player(Seat::West).score, 25000);
        drop(guard);

        // Nothing left to undo.
        let result =
            apply_command(&state, &room, ConnectionRole::Control, GameCommand::Undo).await;
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn hydration_restores_state_after_restart() {
        let (state, store) = app_state();
        install_store(&state, &store).await;
        let room = state.room_entry("654321");

        apply_command(
            &state,
            &room,
            ConnectionRole::Control,
            GameCommand::SetScore {
                seat: Seat::North,
                score: 31000,
            },
        )
        .await
        .unwrap();

        // Simulate a restart: fresh AppState, same store.
        let restarted = AppState::new(
            AppConfig::default(),
            Arc::new(SharedKeyAuthorizer::new("key")),
        );
        restarted
            .set_snapshot_store(Arc::new(Arc::clone(&store)))
            .await;
        let revived = restarted.room_entry("654321");
        hydrate_room(&restarted, &revived).await;

        let guard = revived.state().lock().await;
        assert_eq!(guard.as_ref().unwrap().player(Seat::North).score, 31000);
    }

    #[tokio::test]
    async fn full_state_override_wins_last() {
        let (state, _) = app_state();
        let room = state.room_entry("123456");

        apply_command(
            &state,
            &room,
            ConnectionRole::Control,
            GameCommand::SetScore {
                seat: Seat::East,
                score: 26000,
            },
        )
        .await
        .unwrap();

        let mut dto = {
            let guard = room.state().lock().await;
            GameStateDto::from(guard.as_ref().unwrap())
        };
        dto.match_title = Some("Finals".into());

        apply_command(
            &state,
            &room,
            ConnectionRole::Control,
            GameCommand::SetState { state: dto },
        )
        .await
        .unwrap();

        let guard = room.state().lock().await;
        let game = guard.as_ref().unwrap();
        assert_eq!(game.match_title.as_deref(), Some("Finals"));
        assert_eq!(game.player(Seat::East).score, 26000);
    }

    #[test]
    fn room_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
