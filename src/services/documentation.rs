use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for JanBoard Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_room,
        crate::routes::game::get_game_state,
        crate::routes::sse::room_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::GameStateDto,
            crate::dto::game::PlayerDto,
            crate::dto::game::RiichiStakeDto,
            crate::dto::game::ScoreDiffItemDto,
            crate::dto::game::CreateRoomResponse,
            crate::dto::game::GameStateResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::GameCommand,
            crate::dto::ws::WinOutcomeDto,
            crate::dto::ws::ConnectionRole,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Room creation and snapshot reads"),
        (name = "sse", description = "Server-sent snapshot streams"),
        (name = "ws", description = "WebSocket operations for control and display clients"),
    )
)]
pub struct ApiDoc;
