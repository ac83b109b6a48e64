use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::api;
use crate::state::AppState;

/// Create the REST API router.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(api::health_check))
        .route("/api/text", post(api::process_text))
        .route("/api/session/transcript", get(api::session_transcript))
        .route("/api/session/reset", post(api::reset_session))
        .route("/api/vad/config", get(api::vad_config))
        .layer(TraceLayer::new_for_http())
}
