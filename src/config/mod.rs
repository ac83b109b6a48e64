//! Server configuration.
//!
//! Configuration comes from a YAML file, environment variables and `.env`
//! values, with file values taking precedence: `from_file` parses the YAML
//! and then fills unset credentials from the environment, `from_env` builds
//! everything from the environment alone. Secrets are zeroized when the
//! config is dropped.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;
use zeroize::Zeroize;

use crate::core::markup::VoiceGender;
use crate::core::vad::VADConfig;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port, TLS)
/// - Provider credentials (Azure Speech, OpenAI, Anthropic)
/// - Model selection and refinement settings
/// - Voice and session defaults
/// - Turn-detection defaults
/// - Security settings (CORS, rate limiting)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    // Server settings
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // TLS configuration (optional)
    #[serde(default)]
    pub tls: Option<TlsConfig>,

    /// Azure Speech Services subscription key
    /// (Azure Portal → Speech resource → Keys and Endpoint)
    #[serde(default)]
    pub azure_speech_key: Option<String>,
    /// Azure region the Speech resource is deployed in; the subscription
    /// key is tied to this region
    #[serde(default = "default_azure_speech_region")]
    pub azure_speech_region: String,
    /// OpenAI API key for the primary chat model and the refiner
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// Anthropic API key for the fallback chat model
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    // Model selection
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    /// Model used for the second-stage emotional refinement pass
    #[serde(default = "default_refiner_model")]
    pub refiner_model: String,
    /// Whether the refinement pass runs at all
    #[serde(default = "default_enable_refinement")]
    pub enable_refinement: bool,

    // Voice and session defaults
    #[serde(default = "default_voice_gender")]
    pub voice_gender: VoiceGender,
    /// Messages of history handed to the LLM per call
    #[serde(default = "default_max_memory_turns")]
    pub max_memory_turns: usize,

    // Turn detection defaults, updatable per connection at runtime
    #[serde(default)]
    pub vad: VADConfig,

    /// TTL in seconds for the synthesized-audio cache
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    #[serde(default = "default_rate_limit_requests_per_second")]
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    #[serde(default = "default_rate_limit_burst_size")]
    pub rate_limit_burst_size: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_azure_speech_region() -> String {
    "uaenorth".to_string()
}
fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}
fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_refiner_model() -> String {
    "gpt-4.1-nano".to_string()
}
fn default_enable_refinement() -> bool {
    true
}
fn default_voice_gender() -> VoiceGender {
    VoiceGender::Male
}
fn default_max_memory_turns() -> usize {
    10
}
fn default_cache_ttl_seconds() -> u64 {
    600
}
fn default_rate_limit_requests_per_second() -> u32 {
    60
}
fn default_rate_limit_burst_size() -> u32 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            tls: None,
            azure_speech_key: None,
            azure_speech_region: "uaenorth".to_string(),
            openai_api_key: None,
            anthropic_api_key: None,
            openai_model: "gpt-4.1-mini".to_string(),
            anthropic_model: "claude-sonnet-4-20250514".to_string(),
            refiner_model: "gpt-4.1-nano".to_string(),
            enable_refinement: true,
            voice_gender: VoiceGender::Male,
            max_memory_turns: 10,
            vad: VADConfig::default(),
            cache_ttl_seconds: 600,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

/// Zeroize secret fields when the config is dropped so credentials do not
/// linger in memory.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        if let Some(ref mut key) = self.azure_speech_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.anthropic_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        config.overlay_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, filling unset credentials and
    /// settings from the environment.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        let mut config: ServerConfig = serde_yaml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid config file {}: {e}", path.display()))?;
        config.overlay_env();
        config.validate()?;
        Ok(config)
    }

    /// Fill unset fields from environment variables.
    fn overlay_env(&mut self) {
        if self.azure_speech_key.is_none() {
            // The backup key mirrors the deployment convention of keeping a
            // second subscription available during key rotation
            self.azure_speech_key =
                env_opt("AZURE_SPEECH_KEY").or_else(|| env_opt("AZURE_SPEECH_KEY_BACKUP"));
        }
        if self.openai_api_key.is_none() {
            self.openai_api_key = env_opt("OPENAI_API_KEY");
        }
        if self.anthropic_api_key.is_none() {
            self.anthropic_api_key = env_opt("ANTHROPIC_API_KEY");
        }
        if let Some(region) = env_opt("AZURE_SPEECH_REGION") {
            if self.azure_speech_region == Self::default().azure_speech_region {
                self.azure_speech_region = region;
            }
        }
        if let Some(host) = env_opt("HOST") {
            if self.host == Self::default().host {
                self.host = host;
            }
        }
        if let Some(port) = env_parse::<u16>("PORT") {
            if self.port == Self::default().port {
                self.port = port;
            }
        }
        if self.cors_allowed_origins.is_none() {
            self.cors_allowed_origins = env_opt("CORS_ALLOWED_ORIGINS");
        }
        if let Some(gender) = env_opt("VOICE_GENDER") {
            match VoiceGender::from_str(&gender) {
                Ok(g) => self.voice_gender = g,
                Err(e) => warn!("{e}, keeping {}", self.voice_gender),
            }
        }
        if let Some(timeout) = env_parse::<f64>("VAD_SILENCE_TIMEOUT") {
            self.vad.silence_timeout = timeout;
        }
        if let Some(cap) = env_parse::<f64>("VAD_MAX_TURN_DURATION") {
            self.vad.max_turn_duration = cap;
        }
        if let Some(enabled) = env_parse::<bool>("ENABLE_REFINEMENT") {
            self.enable_refinement = enabled;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.azure_speech_key.as_deref().unwrap_or("").is_empty() {
            anyhow::bail!(
                "Azure Speech key not found. Set AZURE_SPEECH_KEY in the environment \
                 or azure_speech_key in the config file."
            );
        }
        let has_openai = self.openai_api_key.as_deref().is_some_and(|k| !k.is_empty());
        let has_anthropic = self
            .anthropic_api_key
            .as_deref()
            .is_some_and(|k| !k.is_empty());
        if !has_openai && !has_anthropic {
            anyhow::bail!(
                "No LLM credentials found. Set OPENAI_API_KEY and/or ANTHROPIC_API_KEY."
            );
        }
        if !has_openai {
            warn!("OpenAI API key not found, only the Anthropic fallback will be available");
        }
        if !has_anthropic {
            warn!("Anthropic API key not found, no fallback if the primary LLM fails");
        }
        self.vad.validate()?;
        Ok(())
    }

    /// Server bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether TLS is configured.
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }
}

/// Non-empty environment variable lookup.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parsed environment variable lookup; unparseable values are logged and
/// treated as unset.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_opt(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(%key, %raw, "environment value not parseable, ignoring");
            None
        }
    }
}
