use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::game::{CreateRoomResponse, GameStateResponse},
    error::AppError,
    services::{game_service, public_service},
    state::SharedState,
};

/// Room lifecycle and the durable snapshot read path.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", post(create_room))
        .route("/game/{game_id}", get(get_game_state))
}

#[utoipa::path(
    post,
    path = "/game",
    tag = "game",
    responses((status = 200, description = "Room created", body = CreateRoomResponse))
)]
/// Allocate a fresh 6-digit room code. The room stays uninitialized until
/// the first control mutation arrives over the WebSocket.
pub async fn create_room(
    State(state): State<SharedState>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    let response = game_service::create_room(&state).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/game/{game_id}",
    tag = "game",
    params(("game_id" = String, Path, description = "6-digit room code")),
    responses(
        (status = 200, description = "Current snapshot", body = GameStateResponse),
        (status = 404, description = "Unknown or malformed room id")
    )
)]
/// Point-in-time snapshot fetch for newcomers and reconnecting clients,
/// independent of the live channel.
pub async fn get_game_state(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameStateResponse>, AppError> {
    let response = public_service::fetch_snapshot(&state, &game_id).await?;
    Ok(Json(response))
}
