//! OpenAI chat-completions provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ChatMessage, LanguageModel, LlmConfig, LlmError, LlmResult};

pub const OPENAI_API_URL: &str = "https://api.openai.com";

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiChat {
    config: LlmConfig,
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiChat {
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::AuthenticationFailed(
                "OpenAI API key is required".to_string(),
            ));
        }
        if config.model.is_empty() {
            return Err(LlmError::Configuration(
                "OpenAI model must be specified".to_string(),
            ));
        }

        let base = config
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_API_URL.to_string());
        let endpoint = format!("{}/v1/chat/completions", base.trim_end_matches('/'));

        Ok(Self {
            config,
            client: reqwest::Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        debug!(model = %self.config.model, messages = messages.len(), "calling OpenAI");

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
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

        let completion: ChatCompletionResponse = response.json().await?;
        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        info!("OpenAI response received");
        Ok(reply)
    }

    fn provider_info(&self) -> &'static str {
        "OpenAI Chat Completions"
    }
}
