//! Emotion classification for synthesized replies.
//!
//! The language model returns plain text; before synthesis the gateway picks
//! a coarse emotion label from that text and uses it to drive prosody and
//! pause pacing. Detection is a data-driven table of bilingual (Arabic and
//! English) regex patterns, checked in a fixed precedence order, with a
//! punctuation-based fallback for text that matches nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse emotion label attached to a synthesized reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    /// Slow, deliberate delivery with long pauses
    Calm,
    /// Warm, supportive delivery
    Encouraging,
    /// Energetic delivery with short pauses
    Excited,
    /// Soft, empathetic delivery
    Sad,
    /// Default delivery
    #[default]
    Neutral,
}

impl Emotion {
    /// All supported emotion labels.
    pub fn all() -> &'static [Emotion] {
        &[
            Emotion::Calm,
            Emotion::Encouraging,
            Emotion::Excited,
            Emotion::Sad,
            Emotion::Neutral,
        ]
    }

    /// Pause inserted after sentence-ending punctuation (`.`, `!`, `?`),
    /// in milliseconds.
    pub fn sentence_pause_ms(self) -> u32 {
        match self {
            Emotion::Excited => 150,
            Emotion::Calm | Emotion::Sad => 400,
            _ => 300,
        }
    }

    /// Pause inserted after commas, in milliseconds.
    pub fn clause_pause_ms(self) -> u32 {
        match self {
            Emotion::Excited => 100,
            Emotion::Calm | Emotion::Sad => 250,
            _ => 150,
        }
    }

    /// Classify reply text into an emotion label.
    ///
    /// Patterns are checked in precedence order (encouraging, excited, sad,
    /// calm); the first match wins. Text matching no pattern falls back to
    /// punctuation cues, then to [`Emotion::Neutral`].
    pub fn detect(text: &str) -> Emotion {
        if text.trim().is_empty() {
            return Emotion::Neutral;
        }

        let lowered = text.to_lowercase();
        for (emotion, patterns) in EMOTION_PATTERNS.iter() {
            if patterns.iter().any(|p| p.is_match(&lowered)) {
                return *emotion;
            }
        }

        // Punctuation and context fallback
        if text.contains('!') || text.contains('؟') {
            Emotion::Encouraging
        } else if text.contains("...") || lowered.contains("سكت") {
            Emotion::Calm
        } else {
            Emotion::Neutral
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Emotion::Calm => write!(f, "calm"),
            Emotion::Encouraging => write!(f, "encouraging"),
            Emotion::Excited => write!(f, "excited"),
            Emotion::Sad => write!(f, "sad"),
            Emotion::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calm" => Ok(Emotion::Calm),
            "encouraging" => Ok(Emotion::Encouraging),
            "excited" => Ok(Emotion::Excited),
            "sad" => Ok(Emotion::Sad),
            "neutral" => Ok(Emotion::Neutral),
            _ => Err(format!(
                "Unknown emotion: {s}. Supported emotions: calm, encouraging, excited, sad, neutral"
            )),
        }
    }
}

/// Bilingual detection patterns, in precedence order.
///
/// Matched against lowercased text.
static EMOTION_PATTERNS: Lazy<Vec<(Emotion, Vec<Regex>)>> = Lazy::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("invalid emotion pattern"))
            .collect()
    };

    vec![
        (
            Emotion::Encouraging,
            compile(&[
                r"\b(تستطيع|قادر|قوي|ممتاز|رائع|أحسنت|موفق|إن شاء الله بيكون خير|تقدر)\b",
                r"\b(لا تخاف|لا تقلق|أنت بخير|راح يكون أحسن|استمر|امشي قدام)\b",
                r"\b(أنت قوي|عندك قوة|فيك أمل|الله معاك|ثق بنفسك)\b",
                r"\b(you can|you're capable|strong|excellent|great|keep going|trust yourself)\b",
                r"\b(don't worry|don't fear|you're doing well|it will get better|believe in yourself)\b",
                r"\b(proud of you|you've got this|stay positive|you're on the right track)\b",
            ]),
        ),
        (
            Emotion::Excited,
            compile(&[
                r"\b(مبروك|تهانينا|ممتاز جداً|رائع جداً|هذا رائع|عظيم|فرحان لك)\b",
                r"\b(ما شاء الله|الله يبارك فيك|هذا إنجاز عظيم|تطور رائع)\b",
                r"\b(congratulations|amazing|fantastic|wonderful|great job|awesome)\b",
                r"\b(so proud|incredible progress|breakthrough|outstanding|brilliant)\b",
                r"[!]{2,}|[؟]{2,}",
            ]),
        ),
        (
            Emotion::Sad,
            compile(&[
                r"\b(أتفهم ألمك|أعرف أنه صعب|هذا مؤلم|أحس بيك|أحزن لك)\b",
                r"\b(صعب عليك|تعبان|حزين|ألم|معاناة|ابتلاء)\b",
                r"\b(أسف لما تمر به|الله يصبرك|الله يعينك|أدعو لك)\b",
                r"\b(i understand your pain|i know it's hard|i'm sorry you're going through|i feel for you)\b",
                r"\b(difficult|painful|struggling|heartbroken|grieving|loss|suffering)\b",
                r"\b(my heart goes out|sending you strength|you're not alone in this)\b",
            ]),
        ),
        (
            Emotion::Calm,
            compile(&[
                r"\b(هدوء|استرخي|تنفس|سكينة|طمأنينة|اهدأ|خذ وقتك)\b",
                r"\b(بالهدوء|بروية|ببطء|خطوة بخطوة|واحدة واحدة)\b",
                r"\b(التأمل|الصلاة|الذكر|الاستغفار|السكينة|الطمأنينة)\b",
                r"\b(calm|relax|breathe|peaceful|serenity|take your time|slowly)\b",
                r"\b(meditation|mindfulness|deep breath|settle|center yourself)\b",
                r"\b(step by step|one moment at a time|gently|softly)\b",
            ]),
        ),
    ]
});
