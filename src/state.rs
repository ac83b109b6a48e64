//! Shared application state.
//!
//! The engine and its collaborators are constructed once here and injected
//! into request handlers, instead of living as module-level globals.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::ServerConfig;
use crate::core::engine::{EngineOptions, TherapyEngine};
use crate::core::llm::{
    create_llm_provider, FallbackChain, LanguageModel, LlmConfig, OpenAiChat, ResponseRefiner,
};
use crate::core::tts::{create_tts_provider, TtsConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub engine: Arc<TherapyEngine>,
}

impl AppState {
    /// Build the engine from configuration.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let llm = build_llm_chain(&config)?;
        let refiner = build_refiner(&config)?;

        let mut tts_config = TtsConfig::default();
        tts_config.api_key = config.azure_speech_key.clone().unwrap_or_default();
        tts_config.region = config.azure_speech_region.clone();
        let tts =
            create_tts_provider("azure", tts_config).context("failed to create TTS provider")?;

        let engine = TherapyEngine::new(
            llm,
            refiner,
            tts,
            EngineOptions {
                voice_gender: config.voice_gender,
                max_memory_turns: config.max_memory_turns,
                cache_ttl: Duration::from_secs(config.cache_ttl_seconds),
            },
        );

        Ok(Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        })
    }
}

fn build_llm_chain(config: &ServerConfig) -> anyhow::Result<Box<dyn LanguageModel>> {
    let openai = match &config.openai_api_key {
        Some(key) if !key.is_empty() => {
            let mut llm_config = LlmConfig::default();
            llm_config.api_key = key.clone();
            llm_config.model = config.openai_model.clone();
            Some(create_llm_provider("openai", llm_config).context("failed to create OpenAI provider")?)
        }
        _ => None,
    };

    let anthropic = match &config.anthropic_api_key {
        Some(key) if !key.is_empty() => {
            let mut llm_config = LlmConfig::default();
            llm_config.provider = "anthropic".to_string();
            llm_config.api_key = key.clone();
            llm_config.model = config.anthropic_model.clone();
            Some(
                create_llm_provider("anthropic", llm_config)
                    .context("failed to create Anthropic provider")?,
            )
        }
        _ => None,
    };

    match (openai, anthropic) {
        (Some(primary), fallback) => Ok(Box::new(FallbackChain::new(primary, fallback))),
        (None, Some(only)) => Ok(only),
        (None, None) => anyhow::bail!("no LLM credentials configured"),
    }
}

fn build_refiner(config: &ServerConfig) -> anyhow::Result<Option<ResponseRefiner>> {
    if !config.enable_refinement {
        return Ok(None);
    }
    let Some(key) = config.openai_api_key.as_deref().filter(|k| !k.is_empty()) else {
        // Refinement rides on the OpenAI account; without it the pipeline
        // falls back to single-stage replies
        return Ok(None);
    };

    let mut llm_config = LlmConfig::default();
    llm_config.api_key = key.to_string();
    llm_config.model = config.refiner_model.clone();
    llm_config.max_tokens = 2000;
    let model = OpenAiChat::new(llm_config).context("failed to create refiner model")?;
    Ok(Some(ResponseRefiner::new(Arc::new(model))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.azure_speech_key = Some("azure_key".to_string());
        config.openai_api_key = Some("openai_key".to_string());
        config.anthropic_api_key = Some("anthropic_key".to_string());
        config
    }

    #[test]
    fn test_state_builds_with_full_credentials() {
        let state = AppState::new(configured()).unwrap();
        assert_eq!(state.config.port, 8000);
    }

    #[test]
    fn test_state_builds_with_anthropic_only() {
        let mut config = configured();
        config.openai_api_key = None;
        assert!(AppState::new(config).is_ok());
    }

    #[test]
    fn test_refiner_disabled_without_openai() {
        let mut config = configured();
        config.openai_api_key = None;
        let refiner = build_refiner(&config).unwrap();
        assert!(refiner.is_none());
    }

    #[test]
    fn test_refiner_respects_flag() {
        let mut config = configured();
        config.enable_refinement = false;
        assert!(build_refiner(&config).unwrap().is_none());
    }

    #[test]
    fn test_no_llm_credentials_fails() {
        let mut config = configured();
        config.openai_api_key = None;
        config.anthropic_api_key = None;
        assert!(AppState::new(config).is_err());
    }
}
