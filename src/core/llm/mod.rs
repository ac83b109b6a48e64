//! Language-model collaborators.
//!
//! The gateway treats text generation as an external service behind the
//! [`LanguageModel`] trait: the engine hands over the recent conversation
//! and receives plain reply text. Two REST providers are implemented
//! (OpenAI-style chat completions as primary, Anthropic messages as
//! fallback) plus a [`FallbackChain`] that mirrors the
//! primary-then-fallback flow, and a [`refiner`] that performs the second,
//! emotion-enhancement model pass.

pub mod anthropic;
pub mod openai;
pub mod refiner;

pub use anthropic::AnthropicChat;
pub use openai::OpenAiChat;
pub use refiner::{RefinedResponse, RefinementContext, ResponseRefiner};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors produced by language-model providers.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM provider returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("LLM response contained no content")]
    EmptyResponse,

    #[error("LLM response could not be parsed: {0}")]
    InvalidResponse(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// Message author role on the provider wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One chat message on the provider wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Unified provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider name ("openai" or "anthropic")
    pub provider: String,
    /// API key for the provider
    pub api_key: String,
    /// Model identifier (e.g. "gpt-4.1-mini")
    pub model: String,
    /// Endpoint override, mainly for tests; providers supply their
    /// production default when unset
    pub base_url: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Reply token budget
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            model: String::new(),
            base_url: None,
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

/// Trait seam for text-generation collaborators.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate one reply for the given conversation.
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<String>;

    /// Human-readable provider description.
    fn provider_info(&self) -> &'static str;
}

/// Factory function to create LLM providers by name.
pub fn create_llm_provider(
    provider: &str,
    config: LlmConfig,
) -> LlmResult<Box<dyn LanguageModel>> {
    match provider.to_lowercase().as_str() {
        "openai" => Ok(Box::new(OpenAiChat::new(config)?)),
        "anthropic" | "claude" => Ok(Box::new(AnthropicChat::new(config)?)),
        _ => Err(LlmError::Configuration(format!(
            "Unsupported LLM provider: {provider}. Supported providers: openai, anthropic"
        ))),
    }
}

/// Primary provider with an optional fallback.
///
/// The fallback fires only when the primary fails; the switch is logged so
/// quota or outage problems are visible in the traces.
pub struct FallbackChain {
    primary: Box<dyn LanguageModel>,
    fallback: Option<Box<dyn LanguageModel>>,
}

impl FallbackChain {
    pub fn new(primary: Box<dyn LanguageModel>, fallback: Option<Box<dyn LanguageModel>>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl LanguageModel for FallbackChain {
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        match self.primary.complete(messages).await {
            Ok(reply) => Ok(reply),
            Err(primary_err) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        primary = self.primary.provider_info(),
                        error = %primary_err,
                        "primary LLM failed, falling back to {}",
                        fallback.provider_info()
                    );
                    fallback.complete(messages).await
                }
                None => Err(primary_err),
            },
        }
    }

    fn provider_info(&self) -> &'static str {
        "LLM fallback chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel {
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> LlmResult<String> {
            self.reply
                .map(String::from)
                .ok_or(LlmError::EmptyResponse)
        }

        fn provider_info(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_create_llm_provider_openai() {
        let config = LlmConfig {
            api_key: "test_key".to_string(),
            model: "gpt-4.1-mini".to_string(),
            ..Default::default()
        };
        let provider = create_llm_provider("openai", config).unwrap();
        assert_eq!(provider.provider_info(), "OpenAI Chat Completions");
    }

    #[test]
    fn test_create_llm_provider_anthropic_alias() {
        let config = LlmConfig {
            provider: "anthropic".to_string(),
            api_key: "test_key".to_string(),
            model: "claude-sonnet".to_string(),
            ..Default::default()
        };
        let provider = create_llm_provider("claude", config).unwrap();
        assert_eq!(provider.provider_info(), "Anthropic Messages");
    }

    #[test]
    fn test_create_llm_provider_unknown() {
        let result = create_llm_provider("parrot", LlmConfig::default());
        match result {
            Err(LlmError::Configuration(msg)) => {
                assert!(msg.contains("openai"));
                assert!(msg.contains("anthropic"));
            }
            _ => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_create_llm_provider_empty_key() {
        let result = create_llm_provider("openai", LlmConfig::default());
        assert!(matches!(result, Err(LlmError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_fallback_chain_uses_primary() {
        let chain = FallbackChain::new(
            Box::new(FixedModel { reply: Some("primary") }),
            Some(Box::new(FixedModel { reply: Some("fallback") })),
        );
        let reply = chain.complete(&[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(reply, "primary");
    }

    #[tokio::test]
    async fn test_fallback_chain_switches_on_failure() {
        let chain = FallbackChain::new(
            Box::new(FixedModel { reply: None }),
            Some(Box::new(FixedModel { reply: Some("fallback") })),
        );
        let reply = chain.complete(&[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(reply, "fallback");
    }

    #[tokio::test]
    async fn test_fallback_chain_without_fallback_propagates() {
        let chain = FallbackChain::new(Box::new(FixedModel { reply: None }), None);
        let result = chain.complete(&[ChatMessage::user("hi")]).await;
        assert!(matches!(result, Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_chat_message_constructors() {
        assert_eq!(ChatMessage::system("s").role, ChatRole::System);
        assert_eq!(ChatMessage::user("u").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("a").role, ChatRole::Assistant);
    }

    #[test]
    fn test_chat_role_serialization() {
        let msg = ChatMessage::user("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }
}
