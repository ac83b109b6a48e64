//! Speech markup processing.
//!
//! Converts free-form language-model replies into synthesis-ready SSML:
//! [`pauses`] rewrites stage directions, hesitations and punctuation into
//! timed `<break>` directives, and [`ssml`] wraps the result in a prosody
//! document calibrated to emotion and crisis level.

pub mod pauses;
pub mod ssml;

pub use pauses::{add_natural_pauses, KNOWN_MARKERS};
pub use ssml::{build_ssml, clean_ssml_content, voice_for, ProsodySettings, VoiceGender};
