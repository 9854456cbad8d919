use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::Result;
use thiserror::Error;

use crate::alert::Tone;
use crate::posture::Sensitivity;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} threshold must be a finite, non-negative fraction, got {value}")]
    Threshold { name: &'static str, value: f32 },

    #[error("beep interval must be greater than zero")]
    BeepInterval,

    #[error("tone sample rate must be greater than zero")]
    SampleRate,

    #[error("min_face_presence must be within [0, 1], got {0}")]
    Presence(f32),

    #[error("model input size must be greater than zero")]
    InputSize,

    #[error("tone duration must be within 1..={max} ms, got {value}")]
    ToneDuration { value: u64, max: u64 },

    #[error("tone frequency must be a finite, positive number of Hz, got {0}")]
    ToneFrequency(f32),

    #[error("tone amplitude must be within [0, 1], got {0}")]
    ToneAmplitude(f32),
}

/// Longest alert tone a config may ask for.
pub const MAX_TONE_DURATION_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera_id: i32,
    pub model_path: String,
    pub model_input_size: u32,
    pub input_name: String,
    pub landmarks_output: String,
    pub presence_output: Option<String>,
    pub min_face_presence: f32,
    pub look_up_threshold: f32,
    pub look_down_threshold: f32,
    pub beep_interval_ms: u64,
    pub tone_frequency_hz: f32,
    pub tone_duration_ms: u64,
    pub tone_sample_rate: u32,
    pub tone_amplitude: f32,
    pub window_title: String,
}

impl Default for Config {
    fn default() -> Self {
        let sensitivity = Sensitivity::default();
        let tone = Tone::default();
        Self {
            camera_id: 0,
            model_path: "models/face_landmarks.onnx".to_string(),
            model_input_size: 256,
            input_name: "input_1".to_string(),
            landmarks_output: "Identity".to_string(),
            presence_output: Some("Identity_1".to_string()),
            min_face_presence: 0.2,
            look_up_threshold: sensitivity.look_up,
            look_down_threshold: sensitivity.look_down,
            beep_interval_ms: 1000,
            tone_frequency_hz: tone.frequency_hz,
            tone_duration_ms: tone.duration.as_millis() as u64,
            tone_sample_rate: tone.sample_rate,
            tone_amplitude: tone.amplitude,
            window_title: "Posture Alarm".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, value) in [
            ("look_up", self.look_up_threshold),
            ("look_down", self.look_down_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Threshold { name, value });
            }
        }
        if self.beep_interval_ms == 0 {
            return Err(ConfigError::BeepInterval);
        }
        if self.tone_sample_rate == 0 {
            return Err(ConfigError::SampleRate);
        }
        if !(0.0..=1.0).contains(&self.min_face_presence) {
            return Err(ConfigError::Presence(self.min_face_presence));
        }
        if self.model_input_size == 0 {
            return Err(ConfigError::InputSize);
        }
        if self.tone_duration_ms == 0 || self.tone_duration_ms > MAX_TONE_DURATION_MS {
            return Err(ConfigError::ToneDuration {
                value: self.tone_duration_ms,
                max: MAX_TONE_DURATION_MS,
            });
        }
        if !self.tone_frequency_hz.is_finite() || self.tone_frequency_hz <= 0.0 {
            return Err(ConfigError::ToneFrequency(self.tone_frequency_hz));
        }
        // NaN fails the range check as well
        if !(0.0..=1.0).contains(&self.tone_amplitude) {
            return Err(ConfigError::ToneAmplitude(self.tone_amplitude));
        }
        Ok(())
    }

    pub fn sensitivity(&self) -> Sensitivity {
        Sensitivity {
            look_up: self.look_up_threshold,
            look_down: self.look_down_threshold,
        }
    }

    pub fn beep_interval(&self) -> Duration {
        Duration::from_millis(self.beep_interval_ms)
    }

    pub fn tone(&self) -> Tone {
        Tone {
            frequency_hz: self.tone_frequency_hz,
            duration: Duration::from_millis(self.tone_duration_ms),
            sample_rate: self.tone_sample_rate,
            amplitude: self.tone_amplitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
        assert_eq!(Config::default().sensitivity(), Sensitivity::default());
        assert_eq!(Config::default().tone(), Tone::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str("look_up_threshold = 0.4\ncamera_id = 2\n").unwrap();

        assert_eq!(config.camera_id, 2);
        assert_eq!(config.look_up_threshold, 0.4);
        assert_eq!(config.look_down_threshold, 0.60);
        assert_eq!(config.beep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn toml_round_trip_preserves_everything() {
        let mut config = Config::default();
        config.window_title = "Desk".to_string();
        config.presence_output = Some("face_flag".to_string());

        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn rejects_negative_threshold() {
        let config = Config {
            look_down_threshold: -0.1,
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Threshold {
                name: "look_down",
                value: -0.1
            })
        );
    }

    #[test]
    fn rejects_nan_threshold_and_zero_interval() {
        let nan = Config {
            look_up_threshold: f32::NAN,
            ..Config::default()
        };
        assert!(matches!(nan.validate(), Err(ConfigError::Threshold { name: "look_up", .. })));

        let zero = Config {
            beep_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(zero.validate(), Err(ConfigError::BeepInterval));
    }

    #[test]
    fn rejects_presence_out_of_range() {
        let config = Config {
            min_face_presence: 1.5,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Presence(1.5)));
    }

    #[test]
    fn rejects_unbounded_or_empty_tone_duration() {
        for value in [0, MAX_TONE_DURATION_MS + 1, u64::MAX] {
            let config = Config {
                tone_duration_ms: value,
                ..Config::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::ToneDuration {
                    value,
                    max: MAX_TONE_DURATION_MS
                })
            );
        }

        let longest = Config {
            tone_duration_ms: MAX_TONE_DURATION_MS,
            ..Config::default()
        };
        assert_eq!(longest.validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_tone_frequency() {
        for value in [0.0, -5.0, f32::INFINITY] {
            let config = Config {
                tone_frequency_hz: value,
                ..Config::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::ToneFrequency(value)));
        }

        let nan = Config {
            tone_frequency_hz: f32::NAN,
            ..Config::default()
        };
        assert!(matches!(nan.validate(), Err(ConfigError::ToneFrequency(_))));
    }

    #[test]
    fn rejects_bad_tone_amplitude() {
        for value in [-0.1, 1.5] {
            let config = Config {
                tone_amplitude: value,
                ..Config::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::ToneAmplitude(value)));
        }

        let nan = Config {
            tone_amplitude: f32::NAN,
            ..Config::default()
        };
        assert!(matches!(nan.validate(), Err(ConfigError::ToneAmplitude(_))));
    }

    #[test]
    fn validated_tone_synthesizes_finite_samples() {
        let config = Config {
            tone_duration_ms: MAX_TONE_DURATION_MS,
            tone_amplitude: 1.0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Ok(()));

        let samples = config.tone().samples();
        assert_eq!(samples.len(), 441_000);
        assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0 + 1e-6));
    }

    #[test]
    fn save_then_load_from_disk() {
        let path = std::env::temp_dir().join(format!("posture-sentinel-{}.toml", std::process::id()));
        let config = Config {
            camera_id: 3,
            look_down_threshold: 0.75,
            window_title: "Desk".to_string(),
            ..Config::default()
        };

        config.save(&path).unwrap();
        let loaded = Config::load(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.unwrap(), config);
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join("posture-sentinel-does-not-exist.toml");
        assert!(Config::load(&path).is_err());
    }
}
