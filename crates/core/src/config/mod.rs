use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub scores: ScoreConfig,
    #[serde(default)]
    pub trivia: TriviaConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections fall back to their
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!(?path, "loaded configuration");
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Where the synthesized audio ends up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputTarget {
    /// Play through the default output device.
    #[default]
    Device,
    /// Render and discard. Used for headless runs.
    Null,
    /// Stream everything into a 16-bit mono WAV file.
    Wav { path: PathBuf },
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "AudioConfig::default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "AudioConfig::default_block_size")]
    pub block_size: usize,
    #[serde(default = "AudioConfig::default_bpm")]
    pub bpm: f32,
    #[serde(default = "AudioConfig::default_master_gain")]
    pub master_gain: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub output: OutputTarget,
}

impl AudioConfig {
    fn default_sample_rate() -> u32 {
        48_000
    }

    fn default_block_size() -> usize {
        512
    }

    fn default_bpm() -> f32 {
        crate::audio::sequencer::DEFAULT_BPM
    }

    fn default_master_gain() -> f32 {
        1.0
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: Self::default_sample_rate(),
            block_size: Self::default_block_size(),
            bpm: Self::default_bpm(),
            master_gain: Self::default_master_gain(),
            muted: false,
            output: OutputTarget::default(),
        }
    }
}

/// Score book persistence. Without a path the book only lives in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriviaConfig {
    #[serde(default = "TriviaConfig::default_topic")]
    pub topic: String,
    /// JSON file with questions. When absent the trivia game runs on the
    /// offline question set.
    #[serde(default)]
    pub question_file: Option<PathBuf>,
}

impl TriviaConfig {
    fn default_topic() -> String {
        "General Knowledge".to_string()
    }
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            topic: Self::default_topic(),
            question_file: None,
        }
    }
}

/// Game session driving parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed simulation step in milliseconds.
    #[serde(default = "SessionConfig::default_step_ms")]
    pub step_ms: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SessionConfig {
    fn default_step_ms() -> u64 {
        10
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            step_ms: Self::default_step_ms(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "audio": { "bpm": 90.0, "muted": true } }"#).unwrap();

        assert_eq!(config.audio.bpm, 90.0);
        assert!(config.audio.muted);
        assert_eq!(config.audio.sample_rate, 48_000);
        assert_eq!(config.audio.output, OutputTarget::Device);
        assert_eq!(config.trivia.topic, "General Knowledge");
        assert_eq!(config.session.step_ms, 10);
        assert!(config.scores.path.is_none());
    }

    #[test]
    fn parses_wav_output_target() {
        let config: AudioConfig =
            serde_json::from_str(r#"{ "output": { "kind": "wav", "path": "out.wav" } }"#)
                .unwrap();

        assert_eq!(
            config.output,
            OutputTarget::Wav {
                path: PathBuf::from("out.wav")
            }
        );
    }

    #[test]
    fn headless_output_is_opt_in() {
        let config: AudioConfig = serde_json::from_str(r#"{ "output": { "kind": "null" } }"#).unwrap();
        assert_eq!(config.output, OutputTarget::Null);
        assert_eq!(AudioConfig::default().output, OutputTarget::Device);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, crate::ArcadeError::Io(_)));
    }
}
