//! Configuration for the Sauti gateway
//!
//! Layered the usual way: environment variables override the optional
//! `sauti.toml` file, which overrides built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::intent::IntentGrammar;
use crate::speech::VoicePreferences;

/// Default speech locale
const DEFAULT_LANG: &str = "en-US";

/// TTS prosody tuned for clarity: slightly slower, slightly brighter
const DEFAULT_RATE: f32 = 0.88;
const DEFAULT_PITCH: f32 = 1.08;

/// Sauti gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Locale for capture and synthesis
    pub lang: String,

    /// Directory holding the contact vault and key file
    pub data_dir: PathBuf,

    /// Spoken feedback tuning
    pub speech: SpeechConfig,

    /// Parser grammar tables
    pub grammar: IntentGrammar,
}

/// Spoken feedback configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Speaking rate multiplier
    pub rate: f32,

    /// Voice pitch multiplier
    pub pitch: f32,

    /// Ranked voice preferences
    pub voices: VoicePreferences,
}

/// Optional `sauti.toml` contents
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    speech: FileSpeech,
    store: FileStore,
    grammar: Option<IntentGrammar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSpeech {
    lang: Option<String>,
    rate: Option<f32>,
    pitch: Option<f32>,
    preferred_voices: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileStore {
    data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration (env > `sauti.toml` > defaults)
    ///
    /// # Errors
    ///
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load() -> Result<Self> {
        Self::load_from(find_config_file().as_deref())
    }

    /// Load configuration from an explicit file, if any
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let parsed: FileConfig = toml::from_str(&raw)?;
                tracing::debug!(path = %path.display(), "loaded config file");
                parsed
            }
            None => FileConfig::default(),
        };

        let lang = std::env::var("SAUTI_LANG")
            .ok()
            .or(fc.speech.lang)
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        let data_dir = std::env::var("SAUTI_DATA_DIR")
            .ok()
            .map(PathBuf::from)
            .or(fc.store.data_dir)
            .unwrap_or_else(default_data_dir);
        std::fs::create_dir_all(&data_dir).ok();

        let voices = fc.speech.preferred_voices.map_or_else(
            VoicePreferences::default,
            |preferred_names| VoicePreferences {
                preferred_names,
                ..VoicePreferences::default()
            },
        );

        let speech = SpeechConfig {
            rate: std::env::var("SAUTI_TTS_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.speech.rate)
                .unwrap_or(DEFAULT_RATE),
            pitch: std::env::var("SAUTI_TTS_PITCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.speech.pitch)
                .unwrap_or(DEFAULT_PITCH),
            voices,
        };

        Ok(Self {
            lang,
            data_dir,
            speech,
            grammar: fc.grammar.unwrap_or_default(),
        })
    }
}

/// Default data directory: `~/.local/share/sauti` on Linux
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from(".sauti"), |d| d.data_dir().join("sauti"))
}

/// Locate `sauti.toml`: `SAUTI_CONFIG` env var, then the XDG config dir
fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SAUTI_CONFIG") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "SAUTI_CONFIG set but file does not exist");
    }

    let path = directories::BaseDirs::new()?
        .config_dir()
        .join("sauti")
        .join("sauti.toml");
    path.exists().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_from(None).unwrap();
        assert_eq!(config.lang, DEFAULT_LANG);
        assert!((config.speech.rate - DEFAULT_RATE).abs() < f32::EPSILON);
        assert!((config.speech.pitch - DEFAULT_PITCH).abs() < f32::EPSILON);
        assert_eq!(config.grammar.verbs, vec!["send".to_string()]);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[speech]
lang = "en-KE"
rate = 1.0
preferred_voices = ["Zuri"]

[grammar]
verbs = ["send", "tuma"]
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.lang, "en-KE");
        assert!((config.speech.rate - 1.0).abs() < f32::EPSILON);
        // Unset fields keep their defaults
        assert!((config.speech.pitch - DEFAULT_PITCH).abs() < f32::EPSILON);
        assert_eq!(config.speech.voices.preferred_names, vec!["Zuri".to_string()]);
        assert_eq!(config.grammar.verbs.len(), 2);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not [valid toml").unwrap();
        assert!(Config::load_from(Some(file.path())).is_err());
    }
}
