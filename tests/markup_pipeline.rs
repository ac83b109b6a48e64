//! Integration tests for the speech markup pipeline.
//!
//! Verifies the correctness property the synthesis path depends on: stage
//! directions from the language model are always converted into pause
//! directives and never reach the voice as spoken text, from raw reply all
//! the way to the assembled SSML document.

use sakina_gateway::core::crisis::CrisisLevel;
use sakina_gateway::core::emotion::Emotion;
use sakina_gateway::core::language::Language;
use sakina_gateway::core::markup::{add_natural_pauses, build_ssml, KNOWN_MARKERS};

#[test]
fn every_marker_is_eliminated_for_every_emotion() {
    for (marker, _) in KNOWN_MARKERS {
        for emotion in Emotion::all() {
            let out = add_natural_pauses(&format!("hello {marker} world"), *emotion);
            assert!(
                !out.contains('*'),
                "emotion {emotion}: marker {marker} left an asterisk in {out:?}"
            );
            assert!(
                !out.to_lowercase().contains(&marker.to_lowercase()),
                "emotion {emotion}: marker {marker} survived in {out:?}"
            );
            assert!(out.contains("hello"), "surrounding text lost for {marker}");
            assert!(out.contains("world"), "surrounding text lost for {marker}");
        }
    }
}

#[test]
fn sigh_words_from_markers_are_never_spoken() {
    for input in [
        "one *soft sigh* two",
        "one *sigh* two",
        "one <sigh> two",
        "one (sigh) two",
        "one (long sigh) two",
    ] {
        let out = add_natural_pauses(input, Emotion::Neutral);
        // The directive parameter is allowed; the spoken word is not
        let without_breaks = out.replace("<break", "").replace("time=", "");
        assert!(
            !without_breaks.to_lowercase().contains("sigh"),
            "input {input:?} leaked a spoken sigh: {out:?}"
        );
    }
}

#[test]
fn pause_durations_stay_differentiated() {
    let deep_sigh = add_natural_pauses("*deep sigh*", Emotion::Neutral);
    let excited_pause = add_natural_pauses("*excited pause*", Emotion::Neutral);

    assert!(deep_sigh.contains(r#"<break time="600ms"/>"#), "{deep_sigh:?}");
    assert!(
        excited_pause.contains(r#"<break time="200ms"/>"#),
        "{excited_pause:?}"
    );
}

#[test]
fn relative_ordering_sighs_over_pauses_over_excited() {
    let duration = |marker: &str| -> u32 {
        let out = add_natural_pauses(marker, Emotion::Neutral);
        let start = out.find("time=\"").expect("no break emitted") + 6;
        let end = out[start..].find("ms").unwrap() + start;
        out[start..end].parse().unwrap()
    };

    let deep_breath = duration("*deep breath*");
    let deep_sigh = duration("*deep sigh*");
    let thoughtful_pause = duration("*thoughtful pause*");
    let excited_pause = duration("*excited pause*");

    assert!(deep_breath >= deep_sigh);
    assert!(deep_sigh > excited_pause);
    assert!(thoughtful_pause > excited_pause);
}

#[test]
fn emotion_changes_sentence_pacing() {
    let excited = add_natural_pauses("One. Two. Three", Emotion::Excited);
    let calm = add_natural_pauses("One. Two. Three", Emotion::Calm);
    let neutral = add_natural_pauses("One. Two. Three", Emotion::Neutral);

    assert!(excited.contains(r#"time="150ms""#));
    assert!(calm.contains(r#"time="400ms""#));
    assert!(neutral.contains(r#"time="300ms""#));
}

#[test]
fn plain_text_is_stable_under_reprocessing() {
    let first = add_natural_pauses("Hello there.", Emotion::Neutral);
    let second = add_natural_pauses(&first, Emotion::Neutral);
    assert_eq!(first, second, "reprocessing accumulated artifacts");

    let first = add_natural_pauses("First. Second", Emotion::Neutral);
    let second = add_natural_pauses(&first, Emotion::Neutral);
    // The sentence break inserted by the first pass swallows the
    // following whitespace, so the second pass finds nothing new
    assert_eq!(first, second);
}

#[test]
fn thank_you_scenario_end_to_end() {
    let out = add_natural_pauses("Thank you... *soft sigh* ...I understand", Emotion::Calm);

    assert!(out.contains("Thank you"), "{out:?}");
    assert!(out.contains("I understand"), "{out:?}");
    assert!(!out.contains('*'), "{out:?}");
    assert!(!out.to_lowercase().contains("sigh"), "{out:?}");

    // The ellipsis and sigh directives sit adjacent and collapse into a
    // single representative break
    assert_eq!(out.matches("<break").count(), 1, "{out:?}");
    assert!(out.contains(r#"<break time="600ms"/>"#), "{out:?}");
}

#[test]
fn refined_reply_becomes_a_clean_ssml_document() {
    let reply = "I understand this is difficult... *soft sigh* ...let's take this step by step";
    let ssml = build_ssml(
        reply,
        Emotion::Calm,
        Language::English,
        CrisisLevel::None,
        "en-US-BrianNeural",
    );

    assert!(ssml.starts_with("<speak"));
    assert!(ssml.ends_with("</speak>"));
    assert!(ssml.contains(r#"<voice name="en-US-BrianNeural">"#));
    assert!(ssml.contains(r#"rate="-5%""#));
    assert!(!ssml.contains('*'));
    assert!(ssml.contains("<break time="));
    assert!(ssml.contains("step by step"));
}

#[test]
fn arabic_reply_keeps_arabic_text_and_voice() {
    let ssml = build_ssml(
        "أفهم شعورك... *تنهد خفيف* ...خذ وقتك",
        Emotion::Sad,
        Language::Arabic,
        CrisisLevel::None,
        "ar-OM-AbdullahNeural",
    );

    assert!(ssml.contains(r#"xml:lang="ar-OM""#));
    assert!(ssml.contains("أفهم شعورك"));
    assert!(!ssml.contains('*'));
}

#[test]
fn crisis_level_softens_any_emotion() {
    let ssml = build_ssml(
        "You are not alone!",
        Emotion::Excited,
        Language::English,
        CrisisLevel::Severe,
        "en-US-JennyNeural",
    );

    // Severe crisis overrides the excited prosody entirely
    assert!(ssml.contains(r#"rate="-15%""#));
    assert!(ssml.contains(r#"pitch="-10%""#));
    assert!(ssml.contains(r#"volume="soft""#));
}

#[test]
fn model_emitted_ssml_cannot_break_the_document() {
    let hostile = r#"<?xml version="1.0"?><speak><prosody rate="+100%">shout</prosody></speak> <break time='250ms'> fine"#;
    let ssml = build_ssml(
        hostile,
        Emotion::Neutral,
        Language::English,
        CrisisLevel::None,
        "en-US-BrianNeural",
    );

    assert_eq!(ssml.matches("<speak").count(), 1);
    assert_eq!(ssml.matches("<prosody").count(), 1);
    assert!(ssml.contains(r#"<break time="250ms"/>"#));
    assert!(ssml.contains("shout"));
    assert!(ssml.contains("fine"));
}
