//! Speech-synthesis collaborators.
//!
//! Synthesis is an external REST service behind the [`SpeechSynthesizer`]
//! trait: the engine hands over a complete SSML document and receives
//! encoded audio bytes. A small TTL cache avoids re-billing the provider
//! for repeated replies.

pub mod azure;
pub mod cache;

pub use azure::AzureTts;
pub use cache::SynthesisCache;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors produced by synthesis providers.
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("TTS configuration error: {0}")]
    InvalidConfiguration(String),

    #[error("TTS authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("TTS request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("TTS provider returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("TTS provider returned no audio")]
    EmptyAudio,
}

pub type TtsResult<T> = Result<T, TtsError>;

/// Unified synthesis configuration.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Provider name ("azure")
    pub provider: String,
    /// Provider subscription key
    pub api_key: String,
    /// Provider region (e.g. "uaenorth")
    pub region: String,
    /// Audio output format identifier
    pub output_format: String,
    /// Endpoint override, mainly for tests
    pub base_url: Option<String>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            api_key: String::new(),
            region: "uaenorth".to_string(),
            output_format: "audio-48khz-96kbitrate-mono-mp3".to_string(),
            base_url: None,
        }
    }
}

/// Trait seam for speech-synthesis collaborators.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize a complete SSML document into audio bytes.
    async fn synthesize(&self, ssml: &str) -> TtsResult<Bytes>;

    /// Human-readable provider description.
    fn provider_info(&self) -> &'static str;
}

/// Factory function to create a TTS provider by name.
pub fn create_tts_provider(
    provider: &str,
    config: TtsConfig,
) -> TtsResult<Box<dyn SpeechSynthesizer>> {
    match provider.to_lowercase().as_str() {
        "azure" | "microsoft-azure" => Ok(Box::new(AzureTts::new(config)?)),
        _ => Err(TtsError::InvalidConfiguration(format!(
            "Unsupported TTS provider: {provider}. Supported providers: azure"
        ))),
    }
}
