//! WebSocket message types for the audio conversation stream.
//!
//! The client (or an edge speech recognizer) streams recognition events in;
//! the gateway streams transcripts, replies and synthesized audio chunks
//! out. Audio rides as base64 inside JSON frames so a browser client needs
//! no binary protocol.

use serde::{Deserialize, Serialize};

use crate::core::vad::{VADConfig, VADStats};

fn default_confidence() -> f32 {
    1.0
}

/// Messages accepted from the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingMessage {
    /// One recognition event from the upstream recognizer
    Transcript {
        text: String,
        #[serde(default)]
        is_final: bool,
        #[serde(default = "default_confidence")]
        confidence: f32,
    },
    /// Explicit caller-triggered turn cutoff ("stop speaking")
    ForceCompleteTurn,
    /// Request the current turn-detection statistics
    GetVadStats,
    /// Partial turn-detection config update
    UpdateVadConfig {
        #[serde(default)]
        config: serde_json::Map<String, serde_json::Value>,
    },
    /// Clear session memory and start over
    ResetSession,
}

/// Messages pushed to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    /// Session opening line
    Welcome { text: String },
    /// Live feedback for an in-progress hypothesis
    PartialTranscript { text: String },
    /// A committed recognition result
    FinalTranscript { text: String },
    /// The detector closed a turn; processing starts
    TurnComplete { text: String, duration: f64 },
    /// The reply text with its classification
    AiResponse {
        text: String,
        emotion: String,
        language: String,
        is_crisis_detected: bool,
    },
    /// Synthesis started
    TtsStart,
    /// One base64 chunk of synthesized audio
    TtsAudio { chunk: String },
    /// Synthesis finished
    TtsEnd,
    /// Turn-detection statistics snapshot
    VadStats { stats: VADStats },
    /// Applied turn-detection configuration
    VadConfigUpdated { config: VADConfig },
    /// Session memory cleared
    SessionReset,
    /// Anything that went wrong, in client-presentable form
    Error { message: String },
}
