//! Anthropic messages provider, used as the fallback model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ChatMessage, ChatRole, LanguageModel, LlmConfig, LlmError, LlmResult};

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages-API client for Anthropic models.
pub struct AnthropicChat {
    config: LlmConfig,
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl AnthropicChat {
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::AuthenticationFailed(
                "Anthropic API key is required".to_string(),
            ));
        }
        if config.model.is_empty() {
            return Err(LlmError::Configuration(
                "Anthropic model must be specified".to_string(),
            ));
        }

        let base = config
            .base_url
            .clone()
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string());
        let endpoint = format!("{}/v1/messages", base.trim_end_matches('/'));

        Ok(Self {
            config,
            client: reqwest::Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl LanguageModel for AnthropicChat {
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        debug!(model = %self.config.model, messages = messages.len(), "calling Anthropic");

        // The messages API carries the system prompt as a separate field
        let (system, conversation) = match messages.first() {
            Some(first) if first.role == ChatRole::System => {
                (Some(first.content.as_str()), &messages[1..])
            }
            _ => (None, messages),
        };

        let request = MessagesRequest {
            model: &self.config.model,
            system,
            messages: conversation,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: MessagesResponse = response.json().await?;
        let reply = completion
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        info!("Anthropic fallback response received");
        Ok(reply)
    }

    fn provider_info(&self) -> &'static str {
        "Anthropic Messages"
    }
}
