//! Natural-pause insertion for synthesized speech.
//!
//! Language-model replies arrive with free-form stage directions
//! (`*soft sigh*`, `*تنهد خفيف*`), ellipses and hesitation words. Spoken
//! literally these break the illusion of a human voice, so this module
//! rewrites the text into synthesis markup: stage directions become timed
//! `<break>` directives (or are deleted when they describe voice quality
//! rather than timing), hesitation words keep their text but gain pacing
//! breaks around them, and sentence punctuation gets emotion-calibrated
//! pauses.
//!
//! The rewrite is five ordered textual passes with no backtracking:
//!
//! 1. Known-marker substitution, phrase by phrase. Each phrase carries its
//!    own duration; sighs and breaths pause longer than brief pauses.
//! 2. Punctuation runs: `...` and `___` become medium pauses; `<sigh>`,
//!    `*sigh*` and `(sigh)` normalize to 400ms.
//! 3. Hesitation-word pacing in both languages.
//! 4. Emotion-calibrated pauses after `.`/`!`/`?` and `,`.
//! 5. Residual cleanup: unrecognized `*...*` markers are stripped,
//!    parenthesized pause/sigh mentions get canonical durations, runs of
//!    consecutive breaks collapse to a single 600ms break, whitespace is
//!    normalized.
//!
//! The output never contains an asterisk-delimited marker, and never speaks
//! the words "sigh" or "pause" that originated from a stage direction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::emotion::Emotion;

/// Known stage-direction phrases and their pause durations in milliseconds.
///
/// `None` marks voice-quality descriptors that carry no temporal pause and
/// are deleted outright. Matching is case-insensitive and phrase-by-phrase:
/// a blanket catch-all could not give sighs and brief pauses different
/// durations.
pub const KNOWN_MARKERS: &[(&str, Option<u32>)] = &[
    // Sigh variations
    ("*soft sigh*", Some(500)),
    ("*gentle sigh*", Some(450)),
    ("*deep sigh*", Some(600)),
    ("*relieved sigh*", Some(400)),
    ("*tired sigh*", Some(550)),
    ("*sad sigh*", Some(650)),
    ("*thoughtful sigh*", Some(500)),
    ("*proud sigh*", Some(400)),
    // Pause variations
    ("*soft pause*", Some(400)),
    ("*gentle pause*", Some(350)),
    ("*thoughtful pause*", Some(500)),
    ("*encouraging pause*", Some(300)),
    ("*reassuring pause*", Some(350)),
    ("*contemplative pause*", Some(550)),
    ("*excited pause*", Some(200)),
    ("*calming pause*", Some(450)),
    // Arabic emotion markers
    ("*تنهد خفيف*", Some(500)),
    ("*تنهد عميق*", Some(600)),
    ("*تنهد حزين*", Some(650)),
    ("*تنهد مطمئن*", Some(400)),
    ("*وقفة خفيفة*", Some(350)),
    ("*وقفة مطمئنة*", Some(350)),
    ("*وقفة متأملة*", Some(500)),
    ("*وقفة مشجعة*", Some(300)),
    ("*وقفة فرحة*", Some(250)),
    ("*وقفة هادئة*", Some(450)),
    // Breathing and grounding markers
    ("*deep breath*", Some(700)),
    ("*breathe*", Some(600)),
    ("*inhale*", Some(500)),
    ("*exhale*", Some(500)),
    ("*تنفس عميق*", Some(700)),
    ("*شهيق*", Some(500)),
    ("*زفير*", Some(500)),
    // Voice quality markers carry no pause
    ("*whispered*", None),
    ("*softly*", None),
    ("*gently*", None),
    ("*warmly*", None),
    ("*quietly*", None),
    ("*بهمس*", None),
    ("*بلطف*", None),
    ("*بحنان*", None),
];

/// Compiled marker patterns paired with their replacement text.
static MARKER_RULES: Lazy<Vec<(Regex, String)>> = Lazy::new(|| {
    KNOWN_MARKERS
        .iter()
        .map(|(phrase, duration)| {
            let pattern = format!("(?i){}", regex::escape(phrase));
            let replacement = duration.map(break_tag).unwrap_or_default();
            (Regex::new(&pattern).expect("invalid marker pattern"), replacement)
        })
        .collect()
});

static ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}").unwrap());
static UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{3,}").unwrap());
static ANGLE_SIGH: Lazy<Regex> = Lazy::new(|| Regex::new(r"<sigh>").unwrap());
static STAR_SIGH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*sigh\*").unwrap());
static PAREN_SIGH_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(sigh\)").unwrap());

static HESITATION_UM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bu+h*m+\b").unwrap());
static HESITATION_AH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bah+\b").unwrap());
static HESITATION_WELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bwell\b").unwrap());
static HESITATION_YOU_KNOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\byou know\b").unwrap());
static HESITATION_YAANI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bيعني\b").unwrap());
static HESITATION_AH_AR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bأه\b").unwrap());
static HESITATION_UM_AR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bإم\b").unwrap());

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?])\s+").unwrap());
static CLAUSE_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(,)\s+").unwrap());

static RESIDUAL_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*[^*]*\*").unwrap());
static PAREN_PAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\([^)]*pause[^)]*\)").unwrap());
static PAREN_SIGH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\([^)]*sigh[^)]*\)").unwrap());
static BREAK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(<break time="[^"]*"/>\s*){2,}"#).unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Serialize a pause directive.
fn break_tag(ms: u32) -> String {
    format!(r#"<break time="{ms}ms"/>"#)
}

/// Rewrite reply text into synthesis markup with natural pauses.
///
/// Pure transformation: deterministic, no I/O, and never fails — text with
/// no markers or hesitations passes through with only the emotion-paced
/// punctuation breaks applied.
pub fn add_natural_pauses(text: &str, emotion: Emotion) -> String {
    // Pass 1: known stage-direction markers, each with its own duration
    let mut text = text.to_string();
    for (pattern, replacement) in MARKER_RULES.iter() {
        text = pattern.replace_all(&text, replacement.as_str()).into_owned();
    }

    // Pass 2: punctuation runs and alternate sigh notations
    let text = ELLIPSIS.replace_all(&text, break_tag(800)).into_owned();
    let text = UNDERSCORE_RUN.replace_all(&text, break_tag(600)).into_owned();
    let text = ANGLE_SIGH.replace_all(&text, break_tag(400)).into_owned();
    let text = STAR_SIGH.replace_all(&text, break_tag(400)).into_owned();
    let text = PAREN_SIGH_BARE.replace_all(&text, break_tag(400)).into_owned();

    // Pass 3: hesitation words keep their text but gain pacing breaks
    let text = HESITATION_UM
        .replace_all(&text, format!("{}um{}", break_tag(300), break_tag(200)))
        .into_owned();
    let text = HESITATION_AH
        .replace_all(&text, format!("{}ah{}", break_tag(250), break_tag(150)))
        .into_owned();
    let text = HESITATION_WELL
        .replace_all(&text, format!("well{}", break_tag(200)))
        .into_owned();
    let text = HESITATION_YOU_KNOW
        .replace_all(&text, format!("you know{}", break_tag(150)))
        .into_owned();
    let text = HESITATION_YAANI
        .replace_all(&text, format!("يعني{}", break_tag(200)))
        .into_owned();
    let text = HESITATION_AH_AR
        .replace_all(&text, format!("أه{}", break_tag(150)))
        .into_owned();
    let text = HESITATION_UM_AR
        .replace_all(&text, format!("إم{}", break_tag(200)))
        .into_owned();

    // Pass 4: emotion-calibrated pauses after sentence ends and commas.
    // Runs after passes 1-3 so already-inserted directives are untouched.
    let sentence = format!("${{1}}{} ", break_tag(emotion.sentence_pause_ms()));
    let clause = format!("${{1}}{} ", break_tag(emotion.clause_pause_ms()));
    let text = SENTENCE_END.replace_all(&text, sentence.as_str()).into_owned();
    let text = CLAUSE_COMMA.replace_all(&text, clause.as_str()).into_owned();

    // Pass 5: residual cleanup. The catch-all strip runs after the specific
    // table so differentiated durations are preserved for known phrases.
    let text = RESIDUAL_STAR.replace_all(&text, "").into_owned();
    let text = PAREN_PAUSE.replace_all(&text, break_tag(300)).into_owned();
    let text = PAREN_SIGH.replace_all(&text, break_tag(400)).into_owned();
    let text = BREAK_RUN.replace_all(&text, break_tag(600)).into_owned();
    let text = WHITESPACE.replace_all(&text, " ").into_owned();

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let out = add_natural_pauses("Hello there", Emotion::Neutral);
        assert_eq!(out, "Hello there");
    }

    #[test]
    fn test_trailing_period_untouched() {
        // Sentence pauses only apply mid-text where whitespace follows
        let out = add_natural_pauses("Hello there.", Emotion::Neutral);
        assert_eq!(out, "Hello there.");
    }

    #[test]
    fn test_sentence_pause_neutral() {
        let out = add_natural_pauses("First. Second", Emotion::Neutral);
        assert_eq!(out, r#"First.<break time="300ms"/> Second"#);
    }

    #[test]
    fn test_sentence_pause_excited_is_short() {
        let out = add_natural_pauses("First! Second", Emotion::Excited);
        assert!(out.contains(r#"time="150ms""#));
    }

    #[test]
    fn test_clause_pause_calm_is_long() {
        let out = add_natural_pauses("First, second", Emotion::Calm);
        assert!(out.contains(r#"time="250ms""#));
    }

    #[test]
    fn test_soft_sigh_marker() {
        let out = add_natural_pauses("hello *soft sigh* world", Emotion::Neutral);
        assert_eq!(out, r#"hello <break time="500ms"/> world"#);
    }

    #[test]
    fn test_marker_case_insensitive() {
        let out = add_natural_pauses("hello *Deep Sigh* world", Emotion::Neutral);
        assert!(out.contains(r#"time="600ms""#));
        assert!(!out.contains('*'));
    }

    #[test]
    fn test_arabic_marker() {
        let out = add_natural_pauses("أفهم شعورك *تنهد خفيف* هذا طبيعي", Emotion::Calm);
        assert!(out.contains(r#"time="500ms""#));
        assert!(!out.contains('*'));
    }

    #[test]
    fn test_voice_quality_marker_deleted() {
        let out = add_natural_pauses("hello *gently* world", Emotion::Neutral);
        assert_eq!(out, "hello world");
    }

    #[test]
    fn test_duration_differentiation() {
        let sigh = add_natural_pauses("*deep sigh*", Emotion::Neutral);
        let pause = add_natural_pauses("*excited pause*", Emotion::Neutral);
        assert!(sigh.contains(r#"time="600ms""#));
        assert!(pause.contains(r#"time="200ms""#));
        assert_ne!(sigh, pause);
    }

    #[test]
    fn test_ellipsis_and_underscores() {
        let out = add_natural_pauses("wait..... ok", Emotion::Neutral);
        assert!(out.contains(r#"time="800ms""#));
        let out = add_natural_pauses("so ____ anyway", Emotion::Neutral);
        assert!(out.contains(r#"time="600ms""#));
    }

    #[test]
    fn test_alternate_sigh_notations() {
        for input in ["a <sigh> b", "a *sigh* b", "a (sigh) b"] {
            let out = add_natural_pauses(input, Emotion::Neutral);
            assert!(out.contains(r#"time="400ms""#), "input: {input}");
            assert!(!out.to_lowercase().contains("sigh"), "input: {input}");
        }
    }

    #[test]
    fn test_hesitation_words_preserved() {
        let out = add_natural_pauses("ummm I think so", Emotion::Neutral);
        assert!(out.contains("um"));
        assert!(out.contains(r#"<break time="300ms"/>um<break time="200ms"/>"#));

        let out = add_natural_pauses("well that depends", Emotion::Neutral);
        assert!(out.starts_with(r#"well<break time="200ms"/>"#));
    }

    #[test]
    fn test_arabic_hesitations() {
        let out = add_natural_pauses("يعني الموضوع صعب", Emotion::Neutral);
        assert!(out.starts_with(r#"يعني<break time="200ms"/>"#));
    }

    #[test]
    fn test_unknown_marker_stripped() {
        let out = add_natural_pauses("hello *dramatic swoosh* world", Emotion::Neutral);
        assert!(!out.contains('*'));
        assert!(!out.contains("swoosh"));
        assert_eq!(out, "hello world");
    }

    #[test]
    fn test_paren_pause_canonicalized() {
        let out = add_natural_pauses("one (long pause) two", Emotion::Neutral);
        assert!(out.contains(r#"time="300ms""#));
        assert!(!out.to_lowercase().contains("pause)"));
    }

    #[test]
    fn test_consecutive_breaks_collapse() {
        let out = add_natural_pauses("wait... *soft sigh* go on", Emotion::Neutral);
        // 800ms ellipsis break directly followed by the 500ms sigh break
        // collapses into one representative 600ms break
        assert_eq!(out.matches("<break").count(), 1);
        assert!(out.contains(r#"time="600ms""#));
    }

    #[test]
    fn test_idempotent_on_plain_sentences() {
        let first = add_natural_pauses("Hello there.", Emotion::Neutral);
        let second = add_natural_pauses(&first, Emotion::Neutral);
        assert_eq!(first, second);
    }

    #[test]
    fn test_never_fails_on_arbitrary_input() {
        for input in ["", "***", "*", "((", "...", "<>", "\u{0}"] {
            let _ = add_natural_pauses(input, Emotion::Neutral);
        }
    }

    #[test]
    fn test_all_markers_eliminated() {
        for (marker, _) in KNOWN_MARKERS {
            for emotion in Emotion::all() {
                let out = add_natural_pauses(&format!("hello {marker} world"), *emotion);
                assert!(!out.contains('*'), "marker {marker} left an asterisk");
                assert!(
                    !out.to_lowercase().contains(&marker.to_lowercase()),
                    "marker {marker} survived"
                );
            }
        }
    }
}
