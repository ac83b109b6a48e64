//! Integration tests for the WebSocket conversation stream.
//!
//! A real server is bound on an ephemeral port with wiremock standing in
//! for the LLM and TTS collaborators; the client side runs over
//! tokio-tungstenite exactly as a browser or edge recognizer would.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sakina_gateway::config::ServerConfig;
use sakina_gateway::core::engine::{EngineOptions, TherapyEngine};
use sakina_gateway::core::llm::{LlmConfig, OpenAiChat};
use sakina_gateway::core::tts::{AzureTts, TtsConfig};
use sakina_gateway::core::vad::VADConfig;
use sakina_gateway::routes;
use sakina_gateway::state::AppState;

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const REPLY_TEXT: &str = "Take a slow breath, you are safe here.";

/// Start a gateway with mocked collaborators; returns the bound address.
async fn start_server(llm: &MockServer, tts: &MockServer, vad: VADConfig) -> SocketAddr {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": REPLY_TEXT } }]
        })))
        .mount(llm)
        .await;
    Mock::given(method("POST"))
        .and(path("/cognitiveservices/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xABu8; 10_000]))
        .mount(tts)
        .await;

    let engine = TherapyEngine::new(
        Box::new(
            OpenAiChat::new(LlmConfig {
                api_key: "test_key".to_string(),
                model: "gpt-4.1-mini".to_string(),
                base_url: Some(llm.uri()),
                ..Default::default()
            })
            .unwrap(),
        ),
        None,
        Box::new(
            AzureTts::new(TtsConfig {
                api_key: "test_subscription_key".to_string(),
                base_url: Some(tts.uri()),
                ..Default::default()
            })
            .unwrap(),
        ),
        EngineOptions::default(),
    );

    let mut config = ServerConfig::default();
    config.vad = vad;
    let state = AppState {
        config: Arc::new(config),
        engine: Arc::new(engine),
    };

    let app = routes::ws::create_ws_router().with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/audio"))
        .await
        .unwrap();
    client
}

/// Next JSON text frame, skipping transport frames.
async fn next_json(client: &mut WsClient) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(10), client.next())
            .await
            .expect("timed out waiting for server message")
            .expect("connection closed")
            .expect("websocket error");
        if let Message::Text(payload) = frame {
            return serde_json::from_str(payload.as_str()).unwrap();
        }
    }
}

async fn send_json(client: &mut WsClient, value: serde_json::Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn forced_turn_streams_the_full_reply() {
    let llm = MockServer::start().await;
    let tts = MockServer::start().await;
    let addr = start_server(&llm, &tts, VADConfig::default()).await;
    let mut client = connect(addr).await;

    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["type"], "welcome");
    assert!(!welcome["text"].as_str().unwrap().is_empty());

    // Live preview for a partial hypothesis
    send_json(
        &mut client,
        serde_json::json!({ "type": "transcript", "text": "I am", "is_final": false }),
    )
    .await;
    let partial = next_json(&mut client).await;
    assert_eq!(partial["type"], "partial_transcript");
    assert_eq!(partial["text"], "I am");

    // Committed result, then the client cuts the turn off explicitly
    send_json(
        &mut client,
        serde_json::json!({
            "type": "transcript",
            "text": "I am worried about my exams",
            "is_final": true,
            "confidence": 0.92
        }),
    )
    .await;
    let final_t = next_json(&mut client).await;
    assert_eq!(final_t["type"], "final_transcript");

    send_json(&mut client, serde_json::json!({ "type": "force_complete_turn" })).await;

    let turn = next_json(&mut client).await;
    assert_eq!(turn["type"], "turn_complete");
    assert_eq!(turn["text"], "I am worried about my exams");

    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "ai_response");
    assert_eq!(reply["text"], REPLY_TEXT);
    assert_eq!(reply["language"], "en");
    assert_eq!(reply["is_crisis_detected"], false);
    assert!(reply["emotion"].is_string());

    assert_eq!(next_json(&mut client).await["type"], "tts_start");

    // 10000 bytes in 4 KiB chunks: 4096 + 4096 + 1808
    let mut audio = Vec::new();
    loop {
        let frame = next_json(&mut client).await;
        match frame["type"].as_str().unwrap() {
            "tts_audio" => {
                let chunk = base64::engine::general_purpose::STANDARD
                    .decode(frame["chunk"].as_str().unwrap())
                    .unwrap();
                audio.extend_from_slice(&chunk);
            }
            "tts_end" => break,
            other => panic!("unexpected frame during audio stream: {other}"),
        }
    }
    assert_eq!(audio.len(), 10_000);
    assert!(audio.iter().all(|b| *b == 0xAB));
}

#[tokio::test]
async fn silence_completes_a_turn_without_a_command() {
    let llm = MockServer::start().await;
    let tts = MockServer::start().await;
    let addr = start_server(
        &llm,
        &tts,
        VADConfig {
            silence_timeout: 0.3,
            ..Default::default()
        },
    )
    .await;
    let mut client = connect(addr).await;
    assert_eq!(next_json(&mut client).await["type"], "welcome");

    send_json(
        &mut client,
        serde_json::json!({
            "type": "transcript",
            "text": "good evening doctor",
            "is_final": true,
            "confidence": 0.9
        }),
    )
    .await;
    assert_eq!(next_json(&mut client).await["type"], "final_transcript");

    // No command: the debounce timer finishes the turn by itself
    let turn = next_json(&mut client).await;
    assert_eq!(turn["type"], "turn_complete");
    assert_eq!(turn["text"], "good evening doctor");
    assert_eq!(next_json(&mut client).await["type"], "ai_response");
}

#[tokio::test]
async fn vad_commands_round_trip() {
    let llm = MockServer::start().await;
    let tts = MockServer::start().await;
    let addr = start_server(&llm, &tts, VADConfig::default()).await;
    let mut client = connect(addr).await;
    assert_eq!(next_json(&mut client).await["type"], "welcome");

    send_json(&mut client, serde_json::json!({ "type": "get_vad_stats" })).await;
    let stats = next_json(&mut client).await;
    assert_eq!(stats["type"], "vad_stats");
    assert_eq!(stats["stats"]["total_turns"], 0);
    assert_eq!(stats["stats"]["has_active_turn"], false);

    send_json(
        &mut client,
        serde_json::json!({
            "type": "update_vad_config",
            "config": { "silence_timeout": 4.0, "warp_factor": 9 }
        }),
    )
    .await;
    let updated = next_json(&mut client).await;
    assert_eq!(updated["type"], "vad_config_updated");
    assert_eq!(updated["config"]["silence_timeout"], 4.0);
    // Unknown key ignored, recognized defaults untouched
    assert_eq!(updated["config"]["min_turn_chars"], 3);

    send_json(&mut client, serde_json::json!({ "type": "reset_session" })).await;
    assert_eq!(next_json(&mut client).await["type"], "session_reset");
}

#[tokio::test]
async fn invalid_commands_produce_error_frames_not_disconnects() {
    let llm = MockServer::start().await;
    let tts = MockServer::start().await;
    let addr = start_server(&llm, &tts, VADConfig::default()).await;
    let mut client = connect(addr).await;
    assert_eq!(next_json(&mut client).await["type"], "welcome");

    client
        .send(Message::Text("this is not json".to_string().into()))
        .await
        .unwrap();
    let error = next_json(&mut client).await;
    assert_eq!(error["type"], "error");

    send_json(&mut client, serde_json::json!({ "type": "teleport" })).await;
    assert_eq!(next_json(&mut client).await["type"], "error");

    // The connection is still usable afterwards
    send_json(&mut client, serde_json::json!({ "type": "get_vad_stats" })).await;
    assert_eq!(next_json(&mut client).await["type"], "vad_stats");
}
