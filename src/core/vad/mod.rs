//! Voice activity detection (VAD) and turn-taking.
//!
//! This module decides when a stream of speech-recognition events
//! constitutes one complete conversational turn. It consumes the
//! `{text, is_final, confidence}` events an external recognizer produces
//! and emits exactly one turn-complete callback per natural pause, using a
//! debounced silence timer:
//!
//! - Final non-empty segments accumulate and re-arm the timer
//! - Partial hypotheses are preview-only and never touch state
//! - Whitespace-only or too-short turns reset silently instead of waking
//!   the downstream language model for a false start
//! - A hard `max_turn_duration` cap completes run-on speech without
//!   waiting for silence
//!
//! # Example
//!
//! ```rust,ignore
//! use sakina_gateway::core::vad::{VADConfig, VoiceActivityDetector, TurnCallback};
//!
//! let vad = VoiceActivityDetector::new(VADConfig::default());
//! vad.set_turn_complete_callback(TurnCallback::async_fn(|text, _segments| async move {
//!     println!("turn complete: {text}");
//! }))
//! .await;
//!
//! vad.add_speech_segment("hello", true, 0.95).await;
//! // after `silence_timeout` of quiet, the callback fires with "hello"
//! ```

pub mod config;
pub mod detector;

pub use config::VADConfig;
pub use detector::{SpeechSegment, TurnCallback, TurnFuture, VADStats, VoiceActivityDetector};
