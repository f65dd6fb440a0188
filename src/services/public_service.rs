//! Read-only projections of room state for display clients and newcomers.

use crate::{
    dto::{game::GameStateResponse, validation::validate_room_id},
    error::ServiceError,
    services::game_service,
    state::SharedState,
};

/// Point-in-time snapshot fetch keyed by room id, independent of the live
/// channel. This is the durable read path a reconnecting client uses before
/// resubscribing, since missed broadcasts are never replayed.
pub async fn fetch_snapshot(
    state: &SharedState,
    game_id: &str,
) -> Result<GameStateResponse, ServiceError> {
    ensure_room_id(game_id)?;

    if let Some(room) = state.room(game_id) {
        game_service::hydrate_room(state, &room).await;
        return Ok(GameStateResponse {
            game_id: game_id.to_string(),
            state: room.snapshot_dto().await,
        });
    }

    // Room not live: look for a persisted snapshot before declaring it
    // unknown.
    let Some(store) = state.snapshot_store().await else {
        return Err(ServiceError::NotFound(format!(
            "room `{game_id}` not found"
        )));
    };
    match store.find_state(game_id.to_string()).await? {
        Some(_) => {
            // Register the room and let hydration install the snapshot so
            // the live path and this one stay in sync.
            let room = state.room_entry(game_id);
            game_service::hydrate_room(state, &room).await;
            Ok(GameStateResponse {
                game_id: game_id.to_string(),
                state: room.snapshot_dto().await,
            })
        }
        None => Err(ServiceError::NotFound(format!(
            "room `{game_id}` not found"
        ))),
    }
}

/// Reject malformed room ids before they reach the registry or the store.
pub fn ensure_room_id(game_id: &str) -> Result<(), ServiceError> {
    validate_room_id(game_id)
        .map_err(|_| ServiceError::NotFound(format!("malformed room id `{game_id}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(
            ensure_room_id("abc"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            ensure_room_id("12345678"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(ensure_room_id("123456").is_ok());
    }
}
