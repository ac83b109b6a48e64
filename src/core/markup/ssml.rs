//! SSML document assembly.
//!
//! Wraps pause-processed reply text in a `<speak>`/`<voice>`/`<prosody>`
//! document for the synthesis provider. Prosody (rate, pitch, volume) is
//! selected per emotion and then softened further when the conversation is
//! in crisis. Model output is sanitized first so a reply that happens to
//! contain SSML fragments can never produce a malformed document.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::crisis::CrisisLevel;
use crate::core::emotion::Emotion;
use crate::core::language::Language;
use crate::core::markup::pauses::add_natural_pauses;

/// Synthesis voice gender preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Male,
    Female,
}

impl std::fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceGender::Male => write!(f, "male"),
            VoiceGender::Female => write!(f, "female"),
        }
    }
}

impl std::str::FromStr for VoiceGender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(VoiceGender::Male),
            "female" => Ok(VoiceGender::Female),
            _ => Err(format!("Unknown voice gender: {s}. Supported: male, female")),
        }
    }
}

/// Neural voice for a language/gender combination.
pub fn voice_for(language: Language, gender: VoiceGender) -> &'static str {
    match (language, gender) {
        (Language::Arabic, VoiceGender::Male) => "ar-OM-AbdullahNeural",
        (Language::Arabic, VoiceGender::Female) => "ar-OM-AyshaNeural",
        (Language::English, VoiceGender::Male) => "en-US-BrianNeural",
        (Language::English, VoiceGender::Female) => "en-US-JennyNeural",
    }
}

/// Prosody attributes for the generated `<prosody>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProsodySettings {
    pub rate: String,
    pub pitch: String,
    pub volume: String,
}

impl ProsodySettings {
    /// Emotion-specific prosody, tuned to stay natural: aggressive rate and
    /// pitch offsets make neural voices sound robotic or chipmunk-like.
    pub fn for_emotion(emotion: Emotion) -> Self {
        let (rate, pitch, volume) = match emotion {
            Emotion::Calm => ("-5%", "-5%", "soft"),
            Emotion::Encouraging => ("+10%", "+8%", "medium"),
            Emotion::Excited => ("+15%", "+12%", "medium"),
            Emotion::Sad => ("-10%", "-8%", "soft"),
            Emotion::Neutral => ("medium", "medium", "medium"),
        };
        Self {
            rate: rate.to_string(),
            pitch: pitch.to_string(),
            volume: volume.to_string(),
        }
    }

    /// Override prosody for crisis conversations: the worse the assessed
    /// level, the slower and lower the delivery.
    pub fn adjust_for_crisis(&mut self, level: CrisisLevel) {
        match level {
            CrisisLevel::Severe => {
                self.rate = "-15%".to_string();
                self.pitch = "-10%".to_string();
                self.volume = "soft".to_string();
            }
            CrisisLevel::Moderate => {
                self.rate = "-8%".to_string();
                self.pitch = "-6%".to_string();
                self.volume = "soft".to_string();
            }
            CrisisLevel::Mild => {
                self.rate = "-3%".to_string();
                self.pitch = "-2%".to_string();
            }
            CrisisLevel::None => {}
        }
    }
}

static XML_DECLARATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<\?xml[^>]*\?>").unwrap());
static SPEAK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?speak[^>]*>").unwrap());
static VOICE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?voice[^>]*>").unwrap());
static PROSODY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?prosody[^>]*>").unwrap());
static MALFORMED_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<bbreak\s+time="([^"]+)"\s*/?>"#).unwrap());
static SINGLE_QUOTE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<break\s+time='([^']+)'\s*/?>").unwrap());
static BREAK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<break\s+time="([^"]+)"\s*/?>"#).unwrap());
static EMPHASIS_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?emphasis[^>]*>").unwrap());
static PHONEME_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?phoneme[^>]*>").unwrap());
static SAY_AS_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?say-as[^>]*>").unwrap());
static SUB_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?sub[^>]*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip or repair SSML fragments in reply text so only plain text and
/// well-formed `<break>` directives remain inside the generated document.
pub fn clean_ssml_content(text: &str) -> String {
    let text = XML_DECLARATION.replace_all(text, "");
    let text = SPEAK_TAG.replace_all(&text, "");
    let text = VOICE_TAG.replace_all(&text, "");
    let text = PROSODY_TAG.replace_all(&text, "");

    // Repair malformed break variants before normalizing well-formed ones
    let text = MALFORMED_BREAK.replace_all(&text, r#"<break time="$1"/>"#);
    let text = SINGLE_QUOTE_BREAK.replace_all(&text, r#"<break time="$1"/>"#);
    let text = BREAK_TAG.replace_all(&text, r#"<break time="$1"/>"#);

    let text = EMPHASIS_TAG.replace_all(&text, "");
    let text = PHONEME_TAG.replace_all(&text, "");
    let text = SAY_AS_TAG.replace_all(&text, "");
    let text = SUB_TAG.replace_all(&text, "");

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Build a complete SSML document for a reply.
///
/// Runs the natural-pause pipeline, sanitizes the result and wraps it with
/// the voice and emotion/crisis-calibrated prosody.
pub fn build_ssml(
    text: &str,
    emotion: Emotion,
    language: Language,
    crisis_level: CrisisLevel,
    voice_name: &str,
) -> String {
    let mut settings = ProsodySettings::for_emotion(emotion);
    settings.adjust_for_crisis(crisis_level);

    let enhanced = add_natural_pauses(text, emotion);
    let enhanced = clean_ssml_content(&enhanced);

    format!(
        concat!(
            r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="{lang}">"#,
            r#"<voice name="{voice}">"#,
            r#"<prosody rate="{rate}" pitch="{pitch}" volume="{volume}">{body}</prosody>"#,
            r#"</voice></speak>"#
        ),
        lang = language.bcp47(),
        voice = voice_name,
        rate = settings.rate,
        pitch = settings.pitch,
        volume = settings.volume,
        body = enhanced,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_catalog() {
        assert_eq!(
            voice_for(Language::Arabic, VoiceGender::Male),
            "ar-OM-AbdullahNeural"
        );
        assert_eq!(
            voice_for(Language::English, VoiceGender::Female),
            "en-US-JennyNeural"
        );
    }

    #[test]
    fn test_voice_gender_parse() {
        assert_eq!("female".parse::<VoiceGender>().unwrap(), VoiceGender::Female);
        assert_eq!("MALE".parse::<VoiceGender>().unwrap(), VoiceGender::Male);
        assert!("robot".parse::<VoiceGender>().is_err());
    }

    #[test]
    fn test_prosody_for_emotion() {
        let calm = ProsodySettings::for_emotion(Emotion::Calm);
        assert_eq!(calm.rate, "-5%");
        assert_eq!(calm.volume, "soft");

        let excited = ProsodySettings::for_emotion(Emotion::Excited);
        assert_eq!(excited.rate, "+15%");
        assert_eq!(excited.pitch, "+12%");
    }

    #[test]
    fn test_crisis_overrides_prosody() {
        let mut settings = ProsodySettings::for_emotion(Emotion::Excited);
        settings.adjust_for_crisis(CrisisLevel::Severe);
        assert_eq!(settings.rate, "-15%");
        assert_eq!(settings.pitch, "-10%");
        assert_eq!(settings.volume, "soft");
    }

    #[test]
    fn test_crisis_mild_keeps_volume() {
        let mut settings = ProsodySettings::for_emotion(Emotion::Encouraging);
        settings.adjust_for_crisis(CrisisLevel::Mild);
        assert_eq!(settings.rate, "-3%");
        assert_eq!(settings.volume, "medium");
    }

    #[test]
    fn test_crisis_none_is_noop() {
        let mut settings = ProsodySettings::for_emotion(Emotion::Calm);
        let before = settings.clone();
        settings.adjust_for_crisis(CrisisLevel::None);
        assert_eq!(settings, before);
    }

    #[test]
    fn test_clean_strips_embedded_document() {
        let input = r#"<?xml version="1.0"?><speak><voice name="x"><prosody rate="fast">hello</prosody></voice></speak>"#;
        assert_eq!(clean_ssml_content(input), "hello");
    }

    #[test]
    fn test_clean_repairs_malformed_breaks() {
        assert_eq!(
            clean_ssml_content(r#"a <bbreak time="300ms"/> b"#),
            r#"a <break time="300ms"/> b"#
        );
        assert_eq!(
            clean_ssml_content("a <break time='300ms'/> b"),
            r#"a <break time="300ms"/> b"#
        );
    }

    #[test]
    fn test_clean_keeps_valid_breaks() {
        let input = r#"a <break time="300ms"/> b"#;
        assert_eq!(clean_ssml_content(input), input);
    }

    #[test]
    fn test_clean_strips_unsupported_tags() {
        let input = r#"<emphasis level="strong">hi</emphasis> <say-as interpret-as="date">1</say-as>"#;
        assert_eq!(clean_ssml_content(input), "hi 1");
    }

    #[test]
    fn test_build_ssml_structure() {
        let ssml = build_ssml(
            "Take your time",
            Emotion::Calm,
            Language::English,
            CrisisLevel::None,
            "en-US-JennyNeural",
        );
        assert!(ssml.starts_with("<speak"));
        assert!(ssml.ends_with("</speak>"));
        assert!(ssml.contains(r#"xml:lang="en-US""#));
        assert!(ssml.contains(r#"<voice name="en-US-JennyNeural">"#));
        assert!(ssml.contains(r#"rate="-5%""#));
        assert!(ssml.contains("Take your time"));
    }

    #[test]
    fn test_build_ssml_arabic_lang_tag() {
        let ssml = build_ssml(
            "خذ وقتك",
            Emotion::Calm,
            Language::Arabic,
            CrisisLevel::None,
            "ar-OM-AbdullahNeural",
        );
        assert!(ssml.contains(r#"xml:lang="ar-OM""#));
    }

    #[test]
    fn test_build_ssml_converts_markers() {
        let ssml = build_ssml(
            "I hear you *soft sigh* take a moment",
            Emotion::Sad,
            Language::English,
            CrisisLevel::None,
            "en-US-BrianNeural",
        );
        assert!(!ssml.contains('*'));
        assert!(ssml.contains(r#"<break time="500ms"/>"#));
    }

    #[test]
    fn test_build_ssml_crisis_prosody() {
        let ssml = build_ssml(
            "You are safe",
            Emotion::Neutral,
            Language::English,
            CrisisLevel::Severe,
            "en-US-JennyNeural",
        );
        assert!(ssml.contains(r#"rate="-15%""#));
        assert!(ssml.contains(r#"volume="soft""#));
    }

    #[test]
    fn test_build_ssml_embedded_speak_neutralized() {
        let ssml = build_ssml(
            "<speak>hi</speak>",
            Emotion::Neutral,
            Language::English,
            CrisisLevel::None,
            "en-US-JennyNeural",
        );
        // Exactly one speak element pair: ours
        assert_eq!(ssml.matches("<speak").count(), 1);
        assert_eq!(ssml.matches("</speak>").count(), 1);
    }
}
