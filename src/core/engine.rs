//! Conversation engine.
//!
//! One engine instance owns the session: it takes a completed user turn
//! (from the turn detector or the text API), walks it through language
//! detection, crisis checks, the LLM chain, emotional refinement, emotion
//! classification and markup, and returns the reply with synthesis-ready
//! audio. Constructed once at startup and injected through [`crate::state::AppState`]
//! rather than living in a module-level global.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::core::crisis::{self, CrisisLevel};
use crate::core::emotion::Emotion;
use crate::core::language::Language;
use crate::core::llm::{
    ChatMessage, ChatRole, LanguageModel, LlmError, RefinementContext, ResponseRefiner,
};
use crate::core::markup::{build_ssml, voice_for, VoiceGender};
use crate::core::metrics::{TimingStats, TurnTiming};
use crate::core::prompts;
use crate::core::session::{Role, SessionMemory};
use crate::core::tts::{SpeechSynthesizer, SynthesisCache, TtsError};

/// Messages of conversation history handed to the refinement model.
const REFINEMENT_HISTORY_WINDOW: usize = 8;

/// User messages inspected for crisis-level assessment.
const CRISIS_ASSESSMENT_WINDOW: usize = 6;

/// Errors surfaced by the turn pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Tts(#[from] TtsError),

    #[error("empty user input")]
    EmptyInput,
}

/// Engine construction options.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Preferred synthesis voice gender
    pub voice_gender: VoiceGender,
    /// Context window for LLM calls
    pub max_memory_turns: usize,
    /// TTL for the synthesized-audio cache
    pub cache_ttl: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            voice_gender: VoiceGender::Male,
            max_memory_turns: 10,
            cache_ttl: Duration::from_secs(600),
        }
    }
}

/// Everything produced for one processed turn.
pub struct TurnResponse {
    pub user_text: String,
    pub raw_reply: String,
    pub reply: String,
    pub emotion: Emotion,
    pub language: Language,
    pub crisis_detected: bool,
    pub crisis_level: CrisisLevel,
    pub refinement_used: bool,
    pub ssml: String,
    pub audio: Bytes,
    pub timing: TurnTiming,
}

/// The conversation engine.
pub struct TherapyEngine {
    llm: Box<dyn LanguageModel>,
    refiner: Option<ResponseRefiner>,
    tts: Box<dyn SpeechSynthesizer>,
    cache: SynthesisCache,
    memory: RwLock<SessionMemory>,
    timing_history: parking_lot::RwLock<Vec<TurnTiming>>,
    voice_gender: VoiceGender,
}

impl TherapyEngine {
    pub fn new(
        llm: Box<dyn LanguageModel>,
        refiner: Option<ResponseRefiner>,
        tts: Box<dyn SpeechSynthesizer>,
        options: EngineOptions,
    ) -> Self {
        info!(
            llm = llm.provider_info(),
            tts = tts.provider_info(),
            refinement = refiner.is_some(),
            "therapy engine initialized"
        );
        Self {
            llm,
            refiner,
            tts,
            cache: SynthesisCache::new(options.cache_ttl),
            memory: RwLock::new(SessionMemory::new(options.max_memory_turns)),
            timing_history: parking_lot::RwLock::new(Vec::new()),
            voice_gender: options.voice_gender,
        }
    }

    /// The spoken session opening line.
    pub fn welcome_message(&self) -> &'static str {
        prompts::WELCOME_MESSAGE
    }

    /// Process one complete user turn end to end.
    ///
    /// `stt_secs` is the upstream recognition time, reported by the caller
    /// since speech capture happens outside the engine.
    pub async fn process_turn(
        &self,
        user_text: &str,
        stt_secs: f64,
    ) -> Result<TurnResponse, EngineError> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let language = Language::detect(user_text);
        let crisis_detected = crisis::is_crisis(user_text);
        if crisis_detected {
            warn!("crisis language detected in user turn");
        }

        // Record the turn and collect the LLM context
        let (mut messages, crisis_level, stage) = {
            let mut memory = self.memory.write().await;
            memory.set_language(language);
            memory.push_user(user_text);

            let messages: Vec<ChatMessage> =
                memory.recent().into_iter().map(to_chat_message).collect();
            let crisis_level =
                CrisisLevel::assess(memory.recent_user_contents(CRISIS_ASSESSMENT_WINDOW));
            (messages, crisis_level, memory.therapeutic_stage())
        };

        // The crisis protocol is injected into the outgoing call only; the
        // session memory keeps the user's own words
        if crisis_detected {
            if let Some(last) = messages.last_mut() {
                last.content = prompts::enhance_for_crisis(&last.content, true);
            }
        }

        let llm_start = std::time::Instant::now();
        let raw_reply = self.llm.complete(&messages).await?;

        let (reply, refinement_used) = match &self.refiner {
            Some(refiner) => {
                let context = RefinementContext {
                    user_emotion: Emotion::detect(user_text),
                    crisis_level,
                    language,
                    therapeutic_stage: stage,
                    history: messages
                        .iter()
                        .rev()
                        .take(REFINEMENT_HISTORY_WINDOW)
                        .rev()
                        .cloned()
                        .collect(),
                };
                match refiner.refine(&raw_reply, &context).await {
                    Ok(refined) => (refined.refined_response, true),
                    Err(e) => {
                        warn!(error = %e, "emotion refinement failed, using original reply");
                        (raw_reply.clone(), false)
                    }
                }
            }
            None => (raw_reply.clone(), false),
        };
        let llm_secs = llm_start.elapsed().as_secs_f64();

        let emotion = Emotion::detect(&reply);
        {
            let mut memory = self.memory.write().await;
            memory.push_assistant(reply.clone(), self.voice_gender, emotion);
        }

        let voice = voice_for(language, self.voice_gender);
        let ssml = build_ssml(&reply, emotion, language, crisis_level, voice);

        let tts_start = std::time::Instant::now();
        let audio = match self.cache.get(&ssml).await {
            Some(audio) => audio,
            None => {
                let audio = self.tts.synthesize(&ssml).await?;
                self.cache.insert(&ssml, audio.clone()).await;
                audio
            }
        };
        let tts_secs = tts_start.elapsed().as_secs_f64();

        let timing = TurnTiming {
            stt_secs,
            llm_secs,
            tts_secs,
            total_secs: stt_secs + llm_secs + tts_secs,
        };
        self.timing_history.write().push(timing);

        info!(
            %language,
            %emotion,
            %crisis_level,
            refinement_used,
            total_secs = timing.total_secs,
            "turn processed"
        );

        Ok(TurnResponse {
            user_text: user_text.to_string(),
            raw_reply,
            reply,
            emotion,
            language,
            crisis_detected,
            crisis_level,
            refinement_used,
            ssml,
            audio,
            timing,
        })
    }

    /// Rendered session transcript including timing statistics.
    pub async fn transcript(&self) -> String {
        let stats = self.timing_stats();
        self.memory.read().await.render_transcript(stats.as_ref())
    }

    /// Save the rendered transcript under `dir`, returning the file path.
    pub async fn save_transcript(&self, dir: &std::path::Path) -> std::io::Result<std::path::PathBuf> {
        use time::macros::format_description;

        std::fs::create_dir_all(dir)?;
        let stamp = time::OffsetDateTime::now_utc()
            .format(format_description!(
                "session_[year][month][day]_[hour][minute][second].txt"
            ))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        let path = dir.join(stamp);

        let stats = self.timing_stats();
        self.memory
            .read()
            .await
            .save_transcript(&path, stats.as_ref())?;
        info!(path = %path.display(), "session transcript saved");
        Ok(path)
    }

    /// Number of recorded session messages, including the system prompt.
    pub async fn message_count(&self) -> usize {
        self.memory.read().await.len()
    }

    /// Aggregate timing statistics for the session so far.
    pub fn timing_stats(&self) -> Option<TimingStats> {
        TimingStats::from_history(&self.timing_history.read())
    }

    /// Reset the session memory and timing history.
    pub async fn reset_session(&self) {
        self.memory.write().await.reset();
        self.timing_history.write().clear();
    }
}

fn to_chat_message(message: &crate::core::session::ConversationMessage) -> ChatMessage {
    ChatMessage {
        role: match message.role {
            Role::System => ChatRole::System,
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        },
        content: message.content.clone(),
    }
}
