//! Aria - Voice command interpreter for a personal AI assistant
//!
//! This library provides the command interpretation pipeline at the heart of
//! the assistant, plus thin collaborator interfaces around the external
//! speech engines:
//! - Command parsing (regex table + keyword inference) and dispatch
//! - Trigger-phrase preprocessing
//! - STT/TTS HTTP clients and speaker playback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Speech collaborators                    │
//! │   STT (audio → text)   │   TTS (text → speech)      │
//! └────────────────────┬────────────────────────────────┘
//!                      │ transcription
//! ┌────────────────────▼────────────────────────────────┐
//! │              Command interpretation                  │
//! │   Parser (patterns, inference)  →  Executor         │
//! └────────────────────┬────────────────────────────────┘
//!                      │ execution result
//! ┌────────────────────▼────────────────────────────────┐
//! │              Driver (CLI loop)                       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod voice;

pub use commands::{
    CommandExecutor, CommandParser, CommandSpec, CommandTable, ExecutionResult, HandlerKind,
    HistoryEntry, ParsedCommand, SpecExtras, UNKNOWN_COMMAND,
};
pub use config::{Config, VoiceConfig};
pub use error::{Error, Result};
pub use voice::{AudioPlayback, SpeechToText, TextToSpeech, TriggerDetector};
