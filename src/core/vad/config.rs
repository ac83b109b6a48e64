//! Turn-detection configuration types.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for conversational turn detection.
///
/// Timeouts are expressed in seconds to match the client-facing API payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VADConfig {
    /// Seconds of silence after the last final segment before the
    /// accumulated turn is considered complete.
    pub silence_timeout: f64,

    /// Hard cap on turn length in seconds. Continuous speech past this
    /// duration completes the turn without waiting for a silence gap.
    pub max_turn_duration: f64,

    /// Minimum accumulated character count for a turn to be forwarded.
    /// Shorter turns are treated as false starts and silently discarded.
    pub min_turn_chars: usize,
}

impl Default for VADConfig {
    fn default() -> Self {
        Self {
            silence_timeout: 2.5,
            max_turn_duration: 60.0,
            min_turn_chars: 3,
        }
    }
}

impl VADConfig {
    /// Create a new VADConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset tuned for snappy demo interactions.
    pub fn low_latency() -> Self {
        Self {
            silence_timeout: 1.5,
            ..Default::default()
        }
    }

    /// Preset tuned for reflective, slow-paced speakers.
    pub fn patient() -> Self {
        Self {
            silence_timeout: 3.5,
            max_turn_duration: 90.0,
            ..Default::default()
        }
    }

    /// Silence timeout as a [`Duration`].
    pub fn silence_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.silence_timeout.max(0.0))
    }

    /// Maximum turn duration as a [`Duration`].
    pub fn max_turn_duration(&self) -> Duration {
        Duration::from_secs_f64(self.max_turn_duration.max(0.0))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.silence_timeout <= 0.0 {
            anyhow::bail!("VAD silence_timeout must be greater than 0");
        }
        if self.max_turn_duration < 0.0 {
            anyhow::bail!("VAD max_turn_duration must not be negative");
        }
        Ok(())
    }

    /// Apply a partial update from a JSON object (the WebSocket
    /// `update_vad_config` payload shape).
    ///
    /// Recognized keys are applied and logged; unknown keys and values of
    /// the wrong type are logged and ignored rather than treated as errors.
    /// Returns the number of fields that were applied.
    pub fn apply_updates(&mut self, updates: &serde_json::Map<String, serde_json::Value>) -> usize {
        let mut applied = 0;
        for (key, value) in updates {
            match key.as_str() {
                "silence_timeout" => {
                    if let Some(v) = value.as_f64() {
                        self.silence_timeout = v;
                        info!(silence_timeout = v, "updated VAD config");
                        applied += 1;
                    } else {
                        warn!(%key, %value, "VAD config value must be a number, ignoring");
                    }
                }
                "max_turn_duration" => {
                    if let Some(v) = value.as_f64() {
                        self.max_turn_duration = v;
                        info!(max_turn_duration = v, "updated VAD config");
                        applied += 1;
                    } else {
                        warn!(%key, %value, "VAD config value must be a number, ignoring");
                    }
                }
                "min_turn_chars" => {
                    if let Some(v) = value.as_u64() {
                        self.min_turn_chars = v as usize;
                        info!(min_turn_chars = v, "updated VAD config");
                        applied += 1;
                    } else {
                        warn!(%key, %value, "VAD config value must be an integer, ignoring");
                    }
                }
                _ => {
                    warn!(%key, "unknown VAD config parameter, ignoring");
                }
            }
        }
        applied
    }
}
