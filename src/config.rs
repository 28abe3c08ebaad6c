//! Configuration for the Aria assistant
//!
//! Everything the library needs is carried in an explicit [`Config`] value
//! passed into constructors — there are no implicit globals. A partial TOML
//! file at `~/.config/aria/config.toml` overlays the built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Default trigger phrases recognized by the driver loop
const DEFAULT_TRIGGER_PHRASES: &[&str] = &["hey aria", "aria"];

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the persisted command table (loaded and saved at this path)
    pub commands_path: PathBuf,

    /// Trigger phrases for the opt-in preprocessing step
    pub trigger_phrases: Vec<String>,

    /// Voice collaborator configuration
    pub voice: VoiceConfig,
}

/// Voice collaborator configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable spoken responses in the driver loop
    pub enabled: bool,

    /// STT model identifier (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model identifier (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: String,

    /// TTS speed multiplier
    pub tts_speed: f32,

    /// OpenAI API key for the STT/TTS collaborators
    pub openai_api_key: Option<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            openai_api_key: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            commands_path: Self::default_commands_path(),
            trigger_phrases: DEFAULT_TRIGGER_PHRASES
                .iter()
                .map(ToString::to_string)
                .collect(),
            voice: VoiceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration: defaults overlaid with the TOML file at `path`,
    /// or at the standard location when `path` is `None`
    ///
    /// A missing file is not an error — defaults apply. A file that exists
    /// but does not parse is a configuration error.
    ///
    /// # Errors
    ///
    /// Returns error if the config file exists but cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(Self::default_config_path, Path::to_path_buf);
        let mut config = Self::default();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let file: ConfigFile = toml::from_str(&content)?;
            config.apply(file);
            tracing::debug!(path = %path.display(), "loaded config file");
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
        }

        Ok(config)
    }

    /// Overlay a parsed config file onto this configuration
    fn apply(&mut self, file: ConfigFile) {
        if let Some(commands_path) = file.commands_path {
            self.commands_path = PathBuf::from(commands_path);
        }
        if let Some(phrases) = file.trigger_phrases {
            self.trigger_phrases = phrases;
        }

        let voice = file.voice;
        if let Some(enabled) = voice.enabled {
            self.voice.enabled = enabled;
        }
        if let Some(model) = voice.stt_model {
            self.voice.stt_model = model;
        }
        if let Some(model) = voice.tts_model {
            self.voice.tts_model = model;
        }
        if let Some(voice_id) = voice.tts_voice {
            self.voice.tts_voice = voice_id;
        }
        if let Some(speed) = voice.tts_speed {
            self.voice.tts_speed = speed;
        }
        if let Some(key) = voice.openai_api_key {
            self.voice.openai_api_key = Some(key);
        }
    }

    /// Default config file path
    ///
    /// Returns `~/.config/aria/config.toml`
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        directories::BaseDirs::new().map_or_else(
            || PathBuf::from(".config/aria/config.toml"),
            |d| d.config_dir().join("aria").join("config.toml"),
        )
    }

    /// Default command table path
    ///
    /// Returns `~/.local/share/aria/commands.json`
    #[must_use]
    pub fn default_commands_path() -> PathBuf {
        directories::BaseDirs::new().map_or_else(
            || PathBuf::from(".local/share/aria/commands.json"),
            |d| d.data_dir().join("aria").join("commands.json"),
        )
    }

    /// Require an OpenAI API key for voice subcommands
    ///
    /// # Errors
    ///
    /// Returns error if no key is configured
    pub fn require_openai_key(&self) -> Result<&str> {
        self.voice
            .openai_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("OpenAI API key required for voice features".to_string()))
    }
}

/// Top-level TOML configuration file schema
///
/// All fields are optional — the file is a partial overlay on top of defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    /// Override for the command table path
    commands_path: Option<String>,

    /// Override for the trigger phrase list
    trigger_phrases: Option<Vec<String>>,

    /// Voice collaborator settings
    #[serde(default)]
    voice: VoiceFileConfig,
}

/// Voice section of the config file
#[derive(Debug, Default, Deserialize)]
struct VoiceFileConfig {
    enabled: Option<bool>,
    stt_model: Option<String>,
    tts_model: Option<String>,
    tts_voice: Option<String>,
    tts_speed: Option<f32>,
    openai_api_key: Option<String>,
}
