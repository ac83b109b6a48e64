//! Crisis keyword detection and escalation.
//!
//! Two detection surfaces share one data-driven pattern table approach:
//!
//! - [`is_crisis`] flags a single user turn that contains crisis language,
//!   which switches the LLM call to the crisis-protocol prompt.
//! - [`CrisisLevel::assess`] grades the recent conversation into severity
//!   tiers that drive softer, slower synthesis prosody.
//!
//! Patterns cover English and Arabic, including Omani dialect expressions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Crisis severity assessed from recent user messages.
///
/// Ordered so that `Severe > Moderate > Mild > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CrisisLevel {
    #[default]
    None,
    Mild,
    Moderate,
    Severe,
}

impl std::fmt::Display for CrisisLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrisisLevel::None => write!(f, "none"),
            CrisisLevel::Mild => write!(f, "mild"),
            CrisisLevel::Moderate => write!(f, "moderate"),
            CrisisLevel::Severe => write!(f, "severe"),
        }
    }
}

/// Patterns that mark a single turn as a crisis turn.
static CRISIS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Suicide-related keywords
        r"\b(suicide|انتحار|اقتل نفسي|أريد أن أموت|أريد الموت|أفكر في الانتحار|أقتل روحي|أنهي حياتي)\b",
        r"\b(kill myself|end my life|take my own life|أخلص من الحياة|أتخلص من نفسي|أموت أحسن)\b",
        // Self-harm keywords
        r"\b(hurt myself|أؤذي نفسي|أضر نفسي|أجرح نفسي|أعذب نفسي|أقطع نفسي|أحرق نفسي)\b",
        r"\b(cut myself|burn myself|harm myself|أضرب نفسي|أعاقب نفسي|أدمر نفسي)\b",
        // Hopelessness and despair
        r"\b(end it all|أنهي كل شيء|لا أستطيع المتابعة|مافي أمل|مافي فايدة|تعبت من الحياة)\b",
        r"\b(no hope|hopeless|give up|أستسلم|ما عاد أقدر|خلاص انتهيت|مافي معنى للحياة)\b",
        r"\b(can't go on|can't take it|أبي أموت|أبي أخلص|تعبت من كل شي|ما عاد أتحمل)\b",
        // Immediate help requests
        r"\b(help me|ساعدني|أحتاج مساعدة عاجلة|أحتاج مساعدة فورية|أنقذوني|أدعموني)\b",
        r"\b(save me|rescue me|أنقذني|أحتاج أحد|أبي أحد يساعدني|أحتاج دعم نفسي)\b",
        // Crisis expressions in Omani dialect
        r"\b(ما عاد أقدر|خلاص تعبت|أبي أموت|أبي أخلص|تعبت من الدنيا|مافي فايدة مني)\b",
        r"\b(أحس أني عبء|أحس أني مافي داعي لوجودي|الناس أحسن بدوني|أنا مشكلة على الكل)\b",
        // Mental health crisis terms
        r"\b(mental breakdown|nervous breakdown|انهيار نفسي|انهيار عصبي|أنهار نفسياً)\b",
        r"\b(losing my mind|going crazy|أفقد عقلي|أصير مجنون|أحس أني أجن|عقلي راح)\b",
        // Substance abuse crisis
        r"\b(overdose|جرعة زائدة|أبي أخذ حبوب كثير|أشرب دوا كثير|أبي أسكر وأموت)\b",
        // Family/relationship crisis
        r"\b(أبي أهرب من البيت|أبي أترك كل شي|مافي أحد يحبني|كلهم يكرهونني)\b",
        r"\b(أحس أني وحيد|مافي أحد يفهمني|أحس أني منبوذ|أحس أني مرفوض)\b",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("invalid crisis pattern"))
    .collect()
});

/// Severity tiers for [`CrisisLevel::assess`], checked from most severe.
static SEVERITY_KEYWORDS: Lazy<Vec<(CrisisLevel, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        (
            CrisisLevel::Severe,
            vec![
                "أريد أن أموت",
                "أقتل نفسي",
                "suicide",
                "kill myself",
                "end it all",
            ],
        ),
        (
            CrisisLevel::Moderate,
            vec![
                "لا أستطيع",
                "يائس",
                "مكتئب جداً",
                "can't take it",
                "hopeless",
                "severely depressed",
            ],
        ),
        (
            CrisisLevel::Mild,
            vec!["حزين", "قلق", "صعب", "sad", "anxious", "difficult", "struggling"],
        ),
    ]
});

/// Check whether a single user turn contains crisis language.
pub fn is_crisis(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CRISIS_PATTERNS.iter().any(|p| p.is_match(&lowered))
}

impl CrisisLevel {
    /// Assess the crisis level from recent user messages.
    ///
    /// The caller passes the content of the last few user-role messages;
    /// the highest tier with a keyword hit wins.
    pub fn assess<'a, I>(recent_user_messages: I) -> CrisisLevel
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined = recent_user_messages
            .into_iter()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if joined.is_empty() {
            return CrisisLevel::None;
        }

        for (level, keywords) in SEVERITY_KEYWORDS.iter() {
            if keywords.iter().any(|k| joined.contains(k)) {
                return *level;
            }
        }

        CrisisLevel::None
    }
}
