//! WebSocket conversation session.
//!
//! One connection owns one turn detector wired to the shared engine. The
//! socket is split: a writer task drains an outgoing channel so the turn
//! callback, command handling and replies can all push messages without
//! contending for the sink.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::messages::{IncomingMessage, OutgoingMessage};
use crate::core::engine::TherapyEngine;
use crate::core::vad::{SpeechSegment, TurnCallback, VoiceActivityDetector};
use crate::state::AppState;

/// Synthesized audio is streamed in chunks of this many raw bytes.
const TTS_CHUNK_BYTES: usize = 4096;

/// Upgrade handler for `GET /ws/audio`.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| {
        let stream_id = Uuid::new_v4();
        handle_socket(socket, state).instrument(tracing::info_span!("ws", %stream_id))
    })
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("WebSocket connection accepted");
    let (mut sink, mut stream) = socket.split();

    // Writer task: everything outgoing funnels through this channel
    let (tx, mut rx) = mpsc::channel::<OutgoingMessage>(64);
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let payload = match serde_json::to_string(&message) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "failed to serialize outgoing message");
                    continue;
                }
            };
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let vad = VoiceActivityDetector::new(state.config.vad.clone());
    vad.set_turn_complete_callback(turn_callback(Arc::clone(&state.engine), tx.clone()))
        .await;

    let _ = tx
        .send(OutgoingMessage::Welcome {
            text: state.engine.welcome_message().to_string(),
        })
        .await;

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "WebSocket receive error");
                break;
            }
        };

        match frame {
            Message::Text(payload) => {
                match serde_json::from_str::<IncomingMessage>(payload.as_str()) {
                    Ok(message) => handle_message(message, &vad, &state, &tx).await,
                    Err(e) => {
                        warn!(error = %e, "invalid WebSocket command");
                        let _ = tx
                            .send(OutgoingMessage::Error {
                                message: format!("invalid message: {e}"),
                            })
                            .await;
                    }
                }
            }
            Message::Close(_) => break,
            // Ping/pong are handled by axum; binary frames are not part of
            // the protocol (audio decoding lives with the recognizer)
            _ => {}
        }
    }

    info!("WebSocket disconnected");
    drop(tx);
    let _ = writer.await;
}

async fn handle_message(
    message: IncomingMessage,
    vad: &VoiceActivityDetector,
    state: &AppState,
    tx: &mpsc::Sender<OutgoingMessage>,
) {
    match message {
        IncomingMessage::Transcript {
            text,
            is_final,
            confidence,
        } => {
            if is_final {
                if !text.trim().is_empty() {
                    let _ = tx
                        .send(OutgoingMessage::FinalTranscript { text: text.clone() })
                        .await;
                }
            } else {
                let _ = tx
                    .send(OutgoingMessage::PartialTranscript { text: text.clone() })
                    .await;
            }
            vad.add_speech_segment(&text, is_final, confidence).await;
        }
        IncomingMessage::ForceCompleteTurn => {
            info!("force completing current turn");
            vad.force_complete_turn().await;
        }
        IncomingMessage::GetVadStats => {
            let _ = tx
                .send(OutgoingMessage::VadStats {
                    stats: vad.statistics().await,
                })
                .await;
        }
        IncomingMessage::UpdateVadConfig { config } => {
            vad.update_config(&config).await;
            let _ = tx
                .send(OutgoingMessage::VadConfigUpdated {
                    config: vad.config().await,
                })
                .await;
        }
        IncomingMessage::ResetSession => {
            state.engine.reset_session().await;
            vad.reset().await;
            let _ = tx.send(OutgoingMessage::SessionReset).await;
        }
    }
}

/// Build the turn-complete callback: run the full pipeline and stream the
/// results back over the outgoing channel.
fn turn_callback(engine: Arc<TherapyEngine>, tx: mpsc::Sender<OutgoingMessage>) -> TurnCallback {
    TurnCallback::async_fn(move |text: String, segments: Vec<SpeechSegment>| {
        let engine = Arc::clone(&engine);
        let tx = tx.clone();
        async move {
            info!(turn = %text, "processing complete turn");

            let duration = match (segments.first(), segments.last()) {
                (Some(first), Some(last)) => {
                    last.end_time.duration_since(first.start_time).as_secs_f64()
                }
                _ => 0.0,
            };
            let _ = tx
                .send(OutgoingMessage::TurnComplete {
                    text: text.clone(),
                    duration,
                })
                .await;

            let response = match engine.process_turn(&text, duration).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "turn processing failed");
                    let _ = tx
                        .send(OutgoingMessage::Error {
                            message: "Reply generation failed. Please try again.".to_string(),
                        })
                        .await;
                    return;
                }
            };

            let _ = tx
                .send(OutgoingMessage::AiResponse {
                    text: response.reply.clone(),
                    emotion: response.emotion.to_string(),
                    language: response.language.to_string(),
                    is_crisis_detected: response.crisis_detected,
                })
                .await;

            let _ = tx.send(OutgoingMessage::TtsStart).await;
            for chunk in response.audio.chunks(TTS_CHUNK_BYTES) {
                let encoded = base64::engine::general_purpose::STANDARD.encode(chunk);
                if tx
                    .send(OutgoingMessage::TtsAudio { chunk: encoded })
                    .await
                    .is_err()
                {
                    // Client went away mid-stream
                    return;
                }
            }
            let _ = tx.send(OutgoingMessage::TtsEnd).await;
            debug!(audio_bytes = response.audio.len(), "TTS streaming finished");
        }
    })
}
