//! Second-stage emotional refinement.
//!
//! After the therapeutic reply is generated, an optional second model pass
//! rewrites it with natural speech patterns: hesitations, pauses and
//! stage-direction markers such as `*soft sigh*`. Those markers are what
//! the markup pipeline later converts into timed pause directives, so this
//! stage and the markup stage form one two-step pipeline.
//!
//! Refinement is strictly best-effort: a failed call, unparseable JSON or
//! a low-confidence rewrite falls back to the unrefined reply.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::{ChatMessage, LanguageModel, LlmError, LlmResult};
use crate::core::crisis::CrisisLevel;
use crate::core::emotion::Emotion;
use crate::core::language::Language;
use crate::core::session::TherapeuticStage;

/// Rewrites below this confidence are discarded.
pub const MIN_CONFIDENCE: f64 = 0.5;

/// Context handed to the refinement model.
#[derive(Debug, Clone)]
pub struct RefinementContext {
    pub user_emotion: Emotion,
    pub crisis_level: CrisisLevel,
    pub language: Language,
    pub therapeutic_stage: TherapeuticStage,
    /// Recent conversation, oldest first, already truncated by the caller
    pub history: Vec<ChatMessage>,
}

/// Parsed refinement result.
#[derive(Debug, Clone, Deserialize)]
pub struct RefinedResponse {
    pub refined_response: String,
    #[serde(default)]
    pub emotion_enhancements: Vec<String>,
    #[serde(default)]
    pub confidence_score: f64,
}

const BASE_PROMPT: &str = "You are an expert emotional expression enhancer for therapeutic AI conversations. Your role is to take a raw AI therapist response and refine it to include natural emotional expressions, hesitations, sighs, and pauses that make the speech sound genuinely human and therapeutically appropriate.

CRITICAL GUIDELINES:
1. Preserve the core therapeutic message completely
2. Add natural speech patterns (hesitations, pauses, sighs)
3. Maintain cultural sensitivity for Omani/Arabic context
4. Ensure emotional expressions match the conversation context

OUTPUT FORMAT: Return a JSON object with:
- \"refined_response\": Enhanced response with natural expressions
- \"emotion_enhancements\": List of added emotional elements
- \"confidence_score\": Your confidence in the enhancement (0-1)";

const THERAPEUTIC_FOCUS: &str = "
THERAPEUTIC FOCUS:
- Add gentle hesitations before difficult topics
- Include empathetic sighs and pauses
- Use culturally appropriate emotional expressions
- Balance professionalism with human warmth

EXAMPLES OF NATURAL ENHANCEMENTS:
- \"I understand this is difficult... *soft sigh* ...let's take this step by step\"
- \"أفهم شعورك... *تنهد خفيف* ...هذا طبيعي جداً\"
- \"Well... um... that's a really important realization\"";

const CRISIS_FOCUS: &str = "
CRISIS INTERVENTION FOCUS:
- Prioritize calm, steady emotional tone
- Add reassuring pauses and gentle expressions
- Include grounding elements (breathing cues)
- Maintain professional composure with warmth

CRISIS-APPROPRIATE ENHANCEMENTS:
- \"Let's take a deep breath together... *deep breath* ...you're safe right now\"
- \"تنفس معي... *وقفة مطمئنة* ...أنت في أمان الآن\"";

const CELEBRATION_FOCUS: &str = "
POSITIVE MOMENT FOCUS:
- Add excited but controlled enthusiasm
- Include natural celebratory expressions
- Use culturally appropriate praise
- Maintain therapeutic boundaries while celebrating

CELEBRATORY ENHANCEMENTS:
- \"Oh my... *excited pause* ...this is such wonderful progress!\"
- \"ما شاء الله! *وقفة فرحة* ...هذا إنجاز رائع!\"";

/// Best-effort emotional refinement around a [`LanguageModel`].
pub struct ResponseRefiner {
    model: Arc<dyn LanguageModel>,
}

impl ResponseRefiner {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Refine a reply, or explain why the original should be kept.
    pub async fn refine(
        &self,
        original: &str,
        context: &RefinementContext,
    ) -> LlmResult<RefinedResponse> {
        let messages = [
            ChatMessage::system(Self::system_prompt(context)),
            ChatMessage::user(Self::refinement_prompt(original, context)),
        ];

        let raw = self.model.complete(&messages).await?;
        let refined = Self::parse_response(&raw)?;

        if refined.confidence_score <= MIN_CONFIDENCE {
            warn!(
                confidence = refined.confidence_score,
                "low confidence refinement, keeping original response"
            );
            return Err(LlmError::InvalidResponse(format!(
                "refinement confidence {} below threshold",
                refined.confidence_score
            )));
        }

        info!(
            enhancements = refined.emotion_enhancements.len(),
            confidence = refined.confidence_score,
            "emotion refinement succeeded"
        );
        Ok(refined)
    }

    fn system_prompt(context: &RefinementContext) -> String {
        let focus = if context.crisis_level >= CrisisLevel::Moderate {
            CRISIS_FOCUS
        } else if matches!(context.user_emotion, Emotion::Excited | Emotion::Encouraging) {
            CELEBRATION_FOCUS
        } else {
            THERAPEUTIC_FOCUS
        };
        format!("{BASE_PROMPT}\n{focus}")
    }

    fn refinement_prompt(original: &str, context: &RefinementContext) -> String {
        let mut history = String::new();
        if context.history.is_empty() {
            history.push_str("No previous conversation");
        } else {
            for message in &context.history {
                let role = match message.role {
                    super::ChatRole::User => "User",
                    _ => "AI",
                };
                let content: String = message.content.chars().take(100).collect();
                history.push_str(&format!("{role}: {content}\n"));
            }
        }

        format!(
            "REFINEMENT REQUEST:\n\n\
             ORIGINAL AI RESPONSE:\n\"{original}\"\n\n\
             CONTEXT INFORMATION:\n\
             - User Emotional State: {}\n\
             - Crisis Level: {}\n\
             - Cultural Context: {}\n\
             - Therapeutic Stage: {}\n\n\
             RECENT CONVERSATION:\n{history}\n\
             TASK:\n\
             Refine the original response to include natural emotional expressions, \
             hesitations, pauses, and sighs that make it sound genuinely human while \
             maintaining therapeutic appropriateness. Return your response as JSON with \
             the specified format.",
            context.user_emotion,
            context.crisis_level,
            match context.language {
                Language::Arabic => "omani",
                Language::English => "english",
            },
            context.therapeutic_stage,
        )
    }

    /// Parse the model's JSON reply, tolerating markdown code fences.
    fn parse_response(raw: &str) -> LlmResult<RefinedResponse> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .map(|rest| rest.trim_end_matches("```").trim())
            .unwrap_or(trimmed);

        let refined: RefinedResponse = serde_json::from_str(body)
            .map_err(|e| LlmError::InvalidResponse(format!("refinement JSON invalid: {e}")))?;

        if refined.refined_response.trim().is_empty() {
            return Err(LlmError::InvalidResponse(
                "refinement produced empty text".to_string(),
            ));
        }
        Ok(refined)
    }
}
