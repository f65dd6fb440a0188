use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/game/{game_id}/stream",
    tag = "sse",
    params(("game_id" = String, Path, description = "6-digit room code")),
    responses((status = 200, description = "Snapshot event stream for one room", content_type = "text/event-stream", body = String))
)]
/// Stream a room's debounced snapshot broadcasts to a display client that
/// prefers SSE over a WebSocket.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let receiver = sse_service::subscribe_room(&state, &game_id).await?;
    info!(room_id = %game_id, "new SSE subscriber");
    Ok(sse_service::to_sse_stream(receiver))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/game/{game_id}/stream", get(room_stream))
}
