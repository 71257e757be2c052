use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    theme::{ThemeConfigs, ThemeId},
    Result, VideoNoiseError,
};

/// Top-level configuration structure for an engine session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub audio: AudioConfig,
    /// Theme selected when the session is created.
    pub theme: ThemeId,
    pub themes: ThemeConfigs,
}

impl EngineConfig {
    /// Parses a JSON document. Missing fields fall back to their defaults and
    /// theme tunables outside their range are clamped.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.validate()?;
        config.themes.sanitize();
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.audio.validate()
    }
}

/// Configuration specific to the signal graph and its analysis taps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub low_cutoff_hz: f32,
    pub high_cutoff_hz: f32,
    pub filter_q: f32,
    /// Averaging constant applied to successive spectrum snapshots.
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            low_cutoff_hz: 250.0,
            high_cutoff_hz: 2_000.0,
            filter_q: 0.707,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AudioConfig {
    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 * 0.5
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(VideoNoiseError::config("sample_rate must be positive"));
        }

        let nyquist = self.nyquist();
        for (name, cutoff) in [
            ("low_cutoff_hz", self.low_cutoff_hz),
            ("high_cutoff_hz", self.high_cutoff_hz),
        ] {
            if !(cutoff > 0.0 && cutoff < nyquist) {
                return Err(VideoNoiseError::config(format!(
                    "{name} must lie in (0, {nyquist}) Hz, got {cutoff}"
                )));
            }
        }

        if !(self.filter_q > 0.0 && self.filter_q.is_finite()) {
            return Err(VideoNoiseError::config("filter_q must be positive"));
        }

        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(VideoNoiseError::config(
                "smoothing_time_constant must lie in [0, 1]",
            ));
        }

        if !(self.min_decibels < self.max_decibels) {
            return Err(VideoNoiseError::config(
                "min_decibels must be lower than max_decibels",
            ));
        }

        Ok(())
    }
}
