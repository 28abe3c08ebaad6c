//! Voice collaborators
//!
//! Thin interfaces around the external speech engines: trigger-phrase
//! preprocessing, HTTP speech-to-text, HTTP text-to-speech, and speaker
//! playback. The interpretation core in [`crate::commands`] only ever sees
//! plain transcription strings.

mod playback;
mod stt;
mod trigger;
mod tts;

pub use playback::AudioPlayback;
pub use stt::SpeechToText;
pub use trigger::TriggerDetector;
pub use tts::TextToSpeech;
