//! Debounced conversational turn detection.
//!
//! The detector consumes the stream of partial/final recognition events
//! produced by an external speech-to-text collaborator and emits one
//! completed turn per natural pause in user speech. Each non-empty final
//! segment is appended to the current turn and re-arms a silence timer;
//! when the timer expires uninterrupted the accumulated text is handed to
//! the registered turn-complete callback exactly once.
//!
//! Timer cancellation is the steady-state path, not an error: every new
//! segment aborts the pending timer task and arms a fresh one. A generation
//! counter stored with the turn state makes any wakeup from an already
//! superseded timer a no-op, so a cancelled timer can never fire into
//! freshly reset state.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace};

use super::config::VADConfig;

/// One speech recognition event with timing information.
#[derive(Debug, Clone)]
pub struct SpeechSegment {
    /// Recognized text
    pub text: String,
    /// When the segment was received
    pub start_time: Instant,
    /// End of the segment (equal to `start_time` for event-style input)
    pub end_time: Instant,
    /// Recognizer confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Whether this is a committed final result
    pub is_final: bool,
}

/// Boxed future returned by asynchronous turn callbacks.
pub type TurnFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Turn-complete callback, chosen by the caller at registration time.
///
/// Synchronous callbacks run inline; asynchronous callbacks are awaited.
/// Either way the detector resets its turn state after the callback
/// finishes, and a slow callback never blocks further
/// [`VoiceActivityDetector::add_speech_segment`] calls.
pub enum TurnCallback {
    Sync(Arc<dyn Fn(String, Vec<SpeechSegment>) + Send + Sync>),
    Async(Arc<dyn Fn(String, Vec<SpeechSegment>) -> TurnFuture + Send + Sync>),
}

impl TurnCallback {
    /// Convenience constructor for synchronous callbacks.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(String, Vec<SpeechSegment>) + Send + Sync + 'static,
    {
        TurnCallback::Sync(Arc::new(f))
    }

    /// Convenience constructor for future-producing callbacks.
    pub fn async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(String, Vec<SpeechSegment>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        TurnCallback::Async(Arc::new(move |text, segments| Box::pin(f(text, segments))))
    }

    async fn invoke(&self, text: String, segments: Vec<SpeechSegment>) {
        match self {
            TurnCallback::Sync(f) => f(text, segments),
            TurnCallback::Async(f) => f(text, segments).await,
        }
    }
}

impl Clone for TurnCallback {
    fn clone(&self) -> Self {
        match self {
            TurnCallback::Sync(f) => TurnCallback::Sync(Arc::clone(f)),
            TurnCallback::Async(f) => TurnCallback::Async(Arc::clone(f)),
        }
    }
}

/// Read-only detector statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct VADStats {
    /// Completed turns since creation or the last reset
    pub total_turns: u64,
    /// Sum of completed turn durations in seconds
    pub total_speech_duration: f64,
    /// Cumulative mean turn duration in seconds
    pub average_turn_length: f64,
    /// Characters accumulated in the in-progress turn
    pub current_turn_length: usize,
    /// Whether a turn-complete callback is currently running
    pub is_processing: bool,
    /// Whether speech has been accumulated since the last completion
    pub has_active_turn: bool,
}

struct TurnState {
    config: VADConfig,
    segments: Vec<SpeechSegment>,
    current_turn_text: String,
    turn_start: Option<Instant>,
    last_speech: Option<Instant>,
    is_processing: bool,
    timer_generation: u64,
    timer_handle: Option<JoinHandle<()>>,
    callback: Option<TurnCallback>,
    total_turns: u64,
    total_speech_duration: f64,
    average_turn_length: f64,
}

impl TurnState {
    fn new(config: VADConfig) -> Self {
        Self {
            config,
            segments: Vec::new(),
            current_turn_text: String::new(),
            turn_start: None,
            last_speech: None,
            is_processing: false,
            timer_generation: 0,
            timer_handle: None,
            callback: None,
            total_turns: 0,
            total_speech_duration: 0.0,
            average_turn_length: 0.0,
        }
    }

    /// Clear the in-progress turn. Invariant restored here: `turn_start`
    /// is `None` exactly when no speech has been accumulated.
    fn reset_turn(&mut self) {
        self.segments.clear();
        self.current_turn_text.clear();
        self.turn_start = None;
        self.last_speech = None;
        self.timer_generation = self.timer_generation.wrapping_add(1);
        if let Some(handle) = self.timer_handle.take() {
            handle.abort();
        }
    }

    fn should_process(&self, now: Instant) -> bool {
        let trimmed = self.current_turn_text.trim();
        if trimmed.is_empty() {
            return false;
        }

        // The hard cap overrides the minimum-content check
        if let Some(start) = self.turn_start {
            if now.duration_since(start) > self.config.max_turn_duration() {
                info!("maximum turn duration exceeded, forcing processing");
                return true;
            }
        }

        trimmed.chars().count() >= self.config.min_turn_chars
    }
}

/// Turn detector for natural conversation pauses.
///
/// Cheap to clone; clones share the same turn state.
#[derive(Clone)]
pub struct VoiceActivityDetector {
    state: Arc<Mutex<TurnState>>,
}

impl VoiceActivityDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: VADConfig) -> Self {
        info!(?config, "VAD initialized");
        Self {
            state: Arc::new(Mutex::new(TurnState::new(config))),
        }
    }

    /// Register the turn-complete callback. Replaces any previous callback.
    pub async fn set_turn_complete_callback(&self, callback: TurnCallback) {
        self.state.lock().await.callback = Some(callback);
    }

    /// Feed one recognition event.
    ///
    /// Final non-empty segments accumulate into the current turn and re-arm
    /// the silence timer; the first such segment of a turn records the turn
    /// start. Empty final segments (recognizer silence markers) are logged
    /// but leave the timer untouched. Partial hypotheses never change state;
    /// they exist for the caller's live-preview use.
    pub async fn add_speech_segment(&self, text: &str, is_final: bool, confidence: f32) {
        if !is_final {
            trace!(text, "partial segment");
            return;
        }

        let now = Instant::now();
        let trimmed = text.trim();

        if trimmed.is_empty() {
            let state = self.state.lock().await;
            if state.turn_start.is_none() {
                debug!("ignoring empty final segment during silence");
            } else {
                debug!("empty final segment, silence timer left running");
            }
            return;
        }

        let over_cap = {
            let mut state = self.state.lock().await;

            if state.turn_start.is_none() {
                state.turn_start = Some(now);
                info!("starting new conversation turn");
            }

            if state.current_turn_text.is_empty() {
                state.current_turn_text = trimmed.to_string();
            } else {
                state.current_turn_text.push(' ');
                state.current_turn_text.push_str(trimmed);
            }
            state.segments.push(SpeechSegment {
                text: text.to_string(),
                start_time: now,
                end_time: now,
                confidence,
                is_final,
            });
            state.last_speech = Some(now);
            debug!(
                segment = text,
                accumulated = %state.current_turn_text,
                "added final segment"
            );

            let over_cap = state
                .turn_start
                .is_some_and(|start| now.duration_since(start) > state.config.max_turn_duration());
            if !over_cap {
                self.arm_silence_timer(&mut state);
            }
            over_cap
        };

        // Continuous speech past the hard cap completes without a silence gap
        if over_cap {
            self.complete_turn().await;
        }
    }

    /// Immediately finalize the current turn if any text has accumulated.
    pub async fn force_complete_turn(&self) {
        let has_text = {
            let state = self.state.lock().await;
            !state.current_turn_text.trim().is_empty()
        };
        if has_text {
            self.complete_turn().await;
        }
    }

    /// The in-progress accumulated text, without side effects.
    pub async fn current_turn_preview(&self) -> String {
        self.state.lock().await.current_turn_text.clone()
    }

    /// Detector statistics, without side effects.
    pub async fn statistics(&self) -> VADStats {
        let state = self.state.lock().await;
        VADStats {
            total_turns: state.total_turns,
            total_speech_duration: state.total_speech_duration,
            average_turn_length: state.average_turn_length,
            current_turn_length: state.current_turn_text.chars().count(),
            is_processing: state.is_processing,
            has_active_turn: state.turn_start.is_some(),
        }
    }

    /// Snapshot of the current configuration.
    pub async fn config(&self) -> VADConfig {
        self.state.lock().await.config.clone()
    }

    /// Apply a partial configuration update (see [`VADConfig::apply_updates`]).
    pub async fn update_config(
        &self,
        updates: &serde_json::Map<String, serde_json::Value>,
    ) -> usize {
        self.state.lock().await.config.apply_updates(updates)
    }

    /// Clear all accumulated state and statistics unconditionally.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.reset_turn();
        state.is_processing = false;
        state.total_turns = 0;
        state.total_speech_duration = 0.0;
        state.average_turn_length = 0.0;
        info!("VAD reset");
    }

    /// Abort any pending silence timer and arm a fresh one.
    ///
    /// Called with the state lock held; the spawned task re-acquires the
    /// lock on expiry and bails out if its generation has been superseded.
    fn arm_silence_timer(&self, state: &mut TurnState) {
        if let Some(handle) = state.timer_handle.take() {
            handle.abort();
        }
        state.timer_generation = state.timer_generation.wrapping_add(1);
        let generation = state.timer_generation;
        let timeout = state.config.silence_timeout();

        let detector = self.clone();
        state.timer_handle = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            detector.on_silence_elapsed(generation).await;
        }));
    }

    async fn on_silence_elapsed(&self, generation: u64) {
        {
            let mut state = self.state.lock().await;
            if state.timer_generation != generation {
                trace!(generation, "stale silence timer wakeup");
                return;
            }
            if !state.should_process(Instant::now()) {
                info!("silence timeout with insufficient speech, resetting turn state");
                state.reset_turn();
                return;
            }
        }
        self.complete_turn().await;
    }

    /// Complete the current turn: update statistics, invoke the callback,
    /// then reset the turn state.
    ///
    /// The state lock is released while the callback runs so new segments
    /// keep flowing; the `is_processing` guard keeps a second completion
    /// from starting in the meantime, and the reset below runs even when
    /// the callback panics.
    async fn complete_turn(&self) {
        let (text, segments, callback) = {
            let mut state = self.state.lock().await;
            if state.is_processing {
                debug!("turn completion already in progress, skipping");
                return;
            }
            if state.current_turn_text.trim().is_empty() {
                return;
            }
            state.is_processing = true;

            let turn_duration = match (state.turn_start, state.last_speech) {
                (Some(start), Some(last)) => last.duration_since(start).as_secs_f64(),
                _ => 0.0,
            };
            state.total_turns += 1;
            state.total_speech_duration += turn_duration;
            state.average_turn_length = state.total_speech_duration / state.total_turns as f64;
            info!(
                turn = state.total_turns,
                duration_secs = turn_duration,
                avg_secs = state.average_turn_length,
                text = %state.current_turn_text,
                "turn complete"
            );

            (
                state.current_turn_text.clone(),
                state.segments.clone(),
                state.callback.clone(),
            )
        };

        if let Some(callback) = callback {
            let invocation = std::panic::AssertUnwindSafe(callback.invoke(text, segments));
            if let Err(panic) = invocation.catch_unwind().await {
                error!(?panic, "turn-complete callback panicked");
            }
        }

        let mut state = self.state.lock().await;
        state.reset_turn();
        state.is_processing = false;
    }
}
