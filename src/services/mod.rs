/// Authorization boundary for control connections.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Room mutation path: commands, persistence, broadcast scheduling.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Read-only snapshot projections.
pub mod public_service;
/// Server-sent snapshot streaming.
pub mod sse_service;
/// Storage connection supervision and degraded-mode toggling.
pub mod storage_supervisor;
/// WebSocket connection and message handling.
pub mod websocket_service;
