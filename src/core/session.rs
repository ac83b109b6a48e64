//! Conversation session memory.
//!
//! Holds the rolling message history for one therapy session: a leading
//! system prompt (swapped in place when the detected input language
//! changes), followed by user/assistant turns. Messages are immutable once
//! recorded apart from that single documented system-prompt swap.

use serde::Serialize;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;

use crate::core::emotion::Emotion;
use crate::core::language::Language;
use crate::core::markup::VoiceGender;
use crate::core::metrics::TimingStats;
use crate::core::prompts;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One recorded conversation message.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    #[serde(serialize_with = "time::serde::rfc3339::serialize")]
    pub timestamp: OffsetDateTime,
    pub voice_gender: Option<VoiceGender>,
    pub emotion: Option<Emotion>,
}

impl ConversationMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: OffsetDateTime::now_utc(),
            voice_gender: None,
            emotion: None,
        }
    }
}

/// Stage of the therapeutic conversation, assessed from session length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TherapeuticStage {
    RapportBuilding,
    Exploration,
    Intervention,
    Closure,
}

impl std::fmt::Display for TherapeuticStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TherapeuticStage::RapportBuilding => write!(f, "rapport_building"),
            TherapeuticStage::Exploration => write!(f, "exploration"),
            TherapeuticStage::Intervention => write!(f, "intervention"),
            TherapeuticStage::Closure => write!(f, "closure"),
        }
    }
}

/// Rolling session memory with a bounded context window for LLM calls.
pub struct SessionMemory {
    messages: Vec<ConversationMessage>,
    max_memory_turns: usize,
    language: Language,
}

impl SessionMemory {
    /// Create a session seeded with the Arabic system prompt.
    pub fn new(max_memory_turns: usize) -> Self {
        let language = Language::Arabic;
        Self {
            messages: vec![ConversationMessage::new(
                Role::System,
                prompts::system_prompt_for(language),
            )],
            max_memory_turns,
            language,
        }
    }

    /// Current conversation language.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Switch the conversation language.
    ///
    /// The one permitted in-place edit: the leading system message's
    /// content is replaced when the detected input language changes;
    /// every other recorded message stays immutable.
    pub fn set_language(&mut self, language: Language) {
        if self.language == language {
            return;
        }
        self.language = language;
        if let Some(first) = self.messages.first_mut() {
            if first.role == Role::System {
                first.content = prompts::system_prompt_for(language).to_string();
                info!(%language, "system prompt switched for detected language");
            }
        }
    }

    /// Record a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ConversationMessage::new(Role::User, content));
    }

    /// Record an assistant reply with its synthesis settings.
    pub fn push_assistant(
        &mut self,
        content: impl Into<String>,
        voice_gender: VoiceGender,
        emotion: Emotion,
    ) {
        let mut message = ConversationMessage::new(Role::Assistant, content);
        message.voice_gender = Some(voice_gender);
        message.emotion = Some(emotion);
        self.messages.push(message);
    }

    /// All recorded messages.
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Number of recorded messages, including the system prompt.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent messages for the LLM call, bounded by the memory
    /// window. The leading system prompt always rides along even after the
    /// window has scrolled past it.
    pub fn recent(&self) -> Vec<&ConversationMessage> {
        let start = self
            .messages
            .len()
            .saturating_sub(self.max_memory_turns)
            .max(1);
        let mut recent = Vec::with_capacity(self.messages.len() - start + 1);
        recent.push(&self.messages[0]);
        recent.extend(self.messages[start..].iter());
        recent
    }

    /// Content of the last `n` user messages, oldest first. Used by crisis
    /// assessment.
    pub fn recent_user_contents(&self, n: usize) -> Vec<&str> {
        let window = self.messages.len().saturating_sub(n);
        self.messages[window..]
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect()
    }

    /// Assess the therapeutic stage from conversation length.
    pub fn therapeutic_stage(&self) -> TherapeuticStage {
        match self.messages.len() {
            0..=4 => TherapeuticStage::RapportBuilding,
            5..=12 => TherapeuticStage::Exploration,
            13..=20 => TherapeuticStage::Intervention,
            _ => TherapeuticStage::Closure,
        }
    }

    /// Clear the session and re-seed the system prompt for the current
    /// language.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(ConversationMessage::new(
            Role::System,
            prompts::system_prompt_for(self.language),
        ));
        info!("session reset");
    }

    /// Render a human-readable transcript, skipping the system prompt.
    pub fn render_transcript(&self, timing: Option<&TimingStats>) -> String {
        let time_format = format_description!("[hour]:[minute]:[second]");
        let date_format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

        let mut out = String::new();
        out.push_str("Sakina Gateway - Session Transcript\n");
        out.push_str(&"=".repeat(50));
        out.push('\n');
        if let Ok(now) = OffsetDateTime::now_utc().format(&date_format) {
            out.push_str(&format!("Session Date: {now}\n"));
        }
        out.push_str(&format!("Total Messages: {}\n", self.messages.len()));
        out.push_str(&"=".repeat(50));
        out.push_str("\n\n");

        for (i, msg) in self.messages.iter().enumerate() {
            if msg.role == Role::System {
                continue;
            }
            let stamp = msg
                .timestamp
                .format(&time_format)
                .unwrap_or_else(|_| String::from("--:--:--"));
            out.push_str(&format!(
                "[{}] {} ({stamp})\n{}\n",
                i + 1,
                msg.role.to_string().to_uppercase(),
                msg.content
            ));
            if msg.voice_gender.is_some() || msg.emotion.is_some() {
                out.push_str(&format!(
                    "    Voice: {}, Emotion: {}\n",
                    msg.voice_gender.map(|g| g.to_string()).unwrap_or_default(),
                    msg.emotion.map(|e| e.to_string()).unwrap_or_default()
                ));
            }
            out.push('\n');
        }

        if let Some(stats) = timing {
            out.push('\n');
            out.push_str(&"=".repeat(50));
            out.push_str("\nTIMING PERFORMANCE STATISTICS\n");
            out.push_str(&"=".repeat(50));
            out.push('\n');
            out.push_str(&stats.render_report());
        }

        out
    }

    /// Save the transcript to a file.
    pub fn save_transcript(
        &self,
        path: &std::path::Path,
        timing: Option<&TimingStats>,
    ) -> std::io::Result<()> {
        std::fs::write(path, self.render_transcript(timing))
    }
}
