//! Input language detection.
//!
//! The gateway serves conversations in Omani Arabic and English. Each user
//! turn is classified by counting Arabic-block versus Latin letters; the
//! detected language selects the system prompt, the synthesis voice and the
//! SSML `xml:lang` tag. Arabic is the default for empty or ambiguous input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Conversation language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "en")]
    English,
}

/// Arabic Unicode blocks, including presentation forms.
static ARABIC_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\u{0600}-\u{06FF}\u{0750}-\u{077F}\u{08A0}-\u{08FF}\u{FB50}-\u{FDFF}\u{FE70}-\u{FEFF}]")
        .unwrap()
});

static LATIN_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]").unwrap());

/// Common English phrases that tip ambiguous input towards English.
const ENGLISH_INDICATORS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "how are you",
    "thank you",
    "yes",
    "no",
    "can you",
    "i am",
    "help me",
];

impl Language {
    /// Detect whether text is primarily English or Arabic.
    ///
    /// English requires a Latin-letter ratio above 0.5 with more than three
    /// Latin letters, or a common English phrase with a ratio above 0.3.
    /// Everything else (including empty input) is Arabic.
    pub fn detect(text: &str) -> Language {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Language::Arabic;
        }

        let lowered = trimmed.to_lowercase();
        let arabic_count = ARABIC_CHARS.find_iter(&lowered).count();
        let latin_count = LATIN_CHARS.find_iter(&lowered).count();
        let total = arabic_count + latin_count;

        if total == 0 {
            return Language::Arabic;
        }

        let english_ratio = latin_count as f32 / total as f32;
        debug!(
            arabic_chars = arabic_count,
            english_chars = latin_count,
            english_ratio,
            "language detection"
        );

        if english_ratio > 0.5 && latin_count > 3 {
            return Language::English;
        }

        let has_indicator = ENGLISH_INDICATORS.iter().any(|w| lowered.contains(w));
        if has_indicator && english_ratio > 0.3 {
            return Language::English;
        }

        Language::Arabic
    }

    /// BCP-47 tag used for the SSML `xml:lang` attribute.
    pub fn bcp47(self) -> &'static str {
        match self {
            Language::Arabic => "ar-OM",
            Language::English => "en-US",
        }
    }

    /// Short code used in API payloads and voice lookup.
    pub fn code(self) -> &'static str {
        match self {
            Language::Arabic => "ar",
            Language::English => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
