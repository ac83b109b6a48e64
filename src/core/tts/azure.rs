//! Azure Speech REST synthesis provider.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use super::{SpeechSynthesizer, TtsConfig, TtsError, TtsResult};

/// Regional endpoint template; the subscription key is tied to the region.
pub fn azure_tts_url(region: &str) -> String {
    format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1")
}

/// REST client for Azure neural text-to-speech.
pub struct AzureTts {
    config: TtsConfig,
    client: reqwest::Client,
    endpoint: String,
}

impl AzureTts {
    pub fn new(config: TtsConfig) -> TtsResult<Self> {
        if config.api_key.is_empty() {
            return Err(TtsError::AuthenticationFailed(
                "Azure Speech subscription key is required".to_string(),
            ));
        }
        if config.region.is_empty() && config.base_url.is_none() {
            return Err(TtsError::InvalidConfiguration(
                "Azure Speech region is required".to_string(),
            ));
        }

        let endpoint = match &config.base_url {
            Some(base) => format!("{}/cognitiveservices/v1", base.trim_end_matches('/')),
            None => azure_tts_url(&config.region),
        };

        Ok(Self {
            config,
            client: reqwest::Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for AzureTts {
    async fn synthesize(&self, ssml: &str) -> TtsResult<Bytes> {
        debug!(bytes = ssml.len(), format = %self.config.output_format, "synthesizing SSML");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.config.output_format)
            .body(ssml.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        info!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio)
    }

    fn provider_info(&self) -> &'static str {
        "Microsoft Azure Text-to-Speech"
    }
}
