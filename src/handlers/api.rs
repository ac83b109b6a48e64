//! REST API handlers.
//!
//! The text endpoint runs the same pipeline as the WebSocket path, minus
//! speech recognition: it exists for typed input and for exercising the
//! full stack without an audio client.

use std::path::Path;

use axum::extract::{Query, State};
use axum::Json;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::core::metrics::{TimingStats, TurnTiming};
use crate::core::vad::VADConfig;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Saved transcripts land here, relative to the working directory.
const TRANSCRIPT_DIR: &str = "transcripts";

fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub engine: &'static str,
    pub timestamp: i64,
}

/// `GET /api/health`
pub async fn health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    // The state extractor only resolves once the engine was built, so
    // reaching this handler implies readiness
    Json(HealthResponse {
        status: "ok",
        engine: "initialized",
        timestamp: unix_now(),
    })
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub user_text: String,
    /// The reply after emotional refinement (what was synthesized)
    pub ai_response: String,
    /// The unrefined first-stage reply, kept for comparison
    pub original_ai_response: String,
    pub tts_audio_base64: String,
    pub detected_emotion: String,
    pub detected_language: String,
    pub is_crisis_detected: bool,
    pub crisis_level: String,
    pub emotion_refinement_used: bool,
    pub timing: TurnTiming,
    pub timestamp: i64,
}

/// `POST /api/text` - full pipeline over one typed turn.
pub async fn process_text(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> AppResult<Json<TextResponse>> {
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("no text provided".to_string()));
    }

    // Typed input has no recognition phase
    let response = state.engine.process_turn(&request.text, 0.0).await?;

    Ok(Json(TextResponse {
        user_text: response.user_text,
        ai_response: response.reply,
        original_ai_response: response.raw_reply,
        tts_audio_base64: base64::engine::general_purpose::STANDARD.encode(&response.audio),
        detected_emotion: response.emotion.to_string(),
        detected_language: response.language.to_string(),
        is_crisis_detected: response.crisis_detected,
        crisis_level: response.crisis_level.to_string(),
        emotion_refinement_used: response.refinement_used,
        timing: response.timing,
        timestamp: unix_now(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct TranscriptQuery {
    /// Also write the transcript to a file under `transcripts/`
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
    pub message_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_stats: Option<TimingStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_file: Option<String>,
}

/// `GET /api/session/transcript`
pub async fn session_transcript(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
) -> AppResult<Json<TranscriptResponse>> {
    let transcript_file = if query.save {
        let path = state
            .engine
            .save_transcript(Path::new(TRANSCRIPT_DIR))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to save transcript: {e}")))?;
        Some(path.display().to_string())
    } else {
        None
    };

    Ok(Json(TranscriptResponse {
        transcript: state.engine.transcript().await,
        message_count: state.engine.message_count().await,
        timing_stats: state.engine.timing_stats(),
        transcript_file,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub status: &'static str,
    pub timestamp: i64,
}

/// `POST /api/session/reset`
pub async fn reset_session(State(state): State<AppState>) -> Json<ResetResponse> {
    state.engine.reset_session().await;
    Json(ResetResponse {
        status: "session_reset",
        timestamp: unix_now(),
    })
}

#[derive(Debug, Serialize)]
pub struct VadConfigResponse {
    pub default_config: VADConfig,
    pub description: serde_json::Value,
}

/// `GET /api/vad/config` - turn-detection defaults with field documentation.
pub async fn vad_config(State(state): State<AppState>) -> Json<VadConfigResponse> {
    Json(VadConfigResponse {
        default_config: state.config.vad.clone(),
        description: serde_json::json!({
            "silence_timeout": "Seconds to wait after speech ends before processing the turn",
            "max_turn_duration": "Maximum turn duration in seconds before forcing processing",
            "min_turn_chars": "Minimum accumulated characters for a turn to be forwarded",
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_parsing() {
        let request: TextRequest = serde_json::from_str(r#"{ "text": "hello" }"#).unwrap();
        assert_eq!(request.text, "hello");
        assert!(serde_json::from_str::<TextRequest>(r#"{}"#).is_err());
    }

    #[test]
    fn test_transcript_query_defaults() {
        let query: TranscriptQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.save);
    }

    #[test]
    fn test_text_response_shape() {
        let response = TextResponse {
            user_text: "hi".to_string(),
            ai_response: "hello".to_string(),
            original_ai_response: "hello".to_string(),
            tts_audio_base64: "AAAA".to_string(),
            detected_emotion: "calm".to_string(),
            detected_language: "english".to_string(),
            is_crisis_detected: false,
            crisis_level: "none".to_string(),
            emotion_refinement_used: true,
            timing: TurnTiming::default(),
            timestamp: 0,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ai_response"], "hello");
        assert_eq!(json["timing"]["total_secs"], 0.0);
    }

    #[test]
    fn test_transcript_response_omits_empty_fields() {
        let response = TranscriptResponse {
            transcript: String::new(),
            message_count: 1,
            timing_stats: None,
            transcript_file: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("timing_stats").is_none());
        assert!(json.get("transcript_file").is_none());
    }
}
