use axum::{Router, routing::get};

use crate::handlers::ws::websocket_handler;
use crate::state::AppState;

/// Create the WebSocket router for the real-time conversation stream.
pub fn create_ws_router() -> Router<AppState> {
    Router::new().route("/ws/audio", get(websocket_handler))
}
