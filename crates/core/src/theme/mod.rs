//! Theme renderers. Every theme is a pure function of its config, the frame's
//! metrics, elapsed time and surface size; nothing carries over between frames.

mod galaxy;
mod mono_wave;
mod palette;
mod particles;

use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

pub use galaxy::GalaxyConfig;
pub use mono_wave::MonoWaveConfig;
pub use palette::{
    find as find_palette, lookup as lookup_palette, Palette, DEFAULT_PALETTE, PALETTES,
};
pub use particles::ParticlesConfig;

use crate::{
    analysis::Metrics,
    conditioning::BandWaves,
    render::{Color, DisplayList, Size},
    Result, VideoNoiseError,
};

/// Everything a renderer may read for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub metrics: Metrics,
    /// Seconds since the engine started.
    pub elapsed: f32,
    /// Logical drawing area.
    pub size: Size,
    /// Conditioned band waveforms, present only for themes that need them.
    pub bands: Option<&'a BandWaves>,
}

impl FrameInputs<'_> {
    /// Energy as a drive value: unclamped above, but never negative or NaN.
    pub fn peak(&self) -> f32 {
        let energy = self.metrics.energy;
        if energy.is_finite() {
            energy.max(0.0)
        } else {
            0.0
        }
    }

    pub fn bass_glow(&self) -> f32 {
        let glow = self.metrics.bass_glow;
        if glow.is_finite() {
            glow.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A theme renderer. Implemented by each theme's config type.
pub trait Theme {
    /// Solid colour the frame is cleared to before drawing.
    fn background(&self) -> Color;

    /// Appends this frame's drawing on top of the cleared background.
    fn draw(&self, inputs: &FrameInputs<'_>, frame: &mut DisplayList);

    fn render(&self, inputs: &FrameInputs<'_>) -> DisplayList {
        let mut frame = DisplayList::new();
        frame.clear(self.background());
        if !inputs.size.is_empty() {
            self.draw(inputs, &mut frame);
        }
        frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeId {
    #[default]
    SpaceGalaxy,
    MonoWave,
    NeonParticles,
}

impl ThemeId {
    pub const ALL: [ThemeId; 3] = [ThemeId::SpaceGalaxy, ThemeId::MonoWave, ThemeId::NeonParticles];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeId::SpaceGalaxy => "space-galaxy",
            ThemeId::MonoWave => "mono-wave",
            ThemeId::NeonParticles => "neon-particles",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ThemeId::SpaceGalaxy => "Space Galaxy",
            ThemeId::MonoWave => "Monochrome Waveform (Dual-Band)",
            ThemeId::NeonParticles => "Minimal Neon Particles",
        }
    }

    /// Whether the renderer draws the conditioned band waveforms.
    pub fn needs_bands(self) -> bool {
        matches!(self, ThemeId::MonoWave)
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = VideoNoiseError;

    fn from_str(s: &str) -> Result<Self> {
        ThemeId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| VideoNoiseError::UnknownTheme(s.to_string()))
    }
}

/// Tunables of all three themes; they coexist so switching keeps settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfigs {
    pub galaxy: GalaxyConfig,
    pub mono_wave: MonoWaveConfig,
    pub particles: ParticlesConfig,
}

impl ThemeConfigs {
    /// Clamps every tunable into range. Returns whether anything changed.
    pub fn sanitize(&mut self) -> bool {
        let galaxy = self.galaxy.sanitize();
        let mono_wave = self.mono_wave.sanitize();
        let particles = self.particles.sanitize();
        galaxy || mono_wave || particles
    }

    /// Merges a JSON object of settings onto one theme's config. Unknown keys
    /// and mistyped values are rejected and leave the config untouched.
    pub fn update(&mut self, id: ThemeId, patch: &Value) -> Result<()> {
        match id {
            ThemeId::SpaceGalaxy => apply_patch(&mut self.galaxy, id, patch),
            ThemeId::MonoWave => {
                apply_patch(&mut self.mono_wave, id, patch)?;
                if !self.mono_wave.has_known_palette() {
                    tracing::warn!(
                        palette = %self.mono_wave.palette,
                        fallback = DEFAULT_PALETTE.id,
                        "unknown palette"
                    );
                }
                Ok(())
            }
            ThemeId::NeonParticles => apply_patch(&mut self.particles, id, patch),
        }
    }

    pub fn render(&self, id: ThemeId, inputs: &FrameInputs<'_>) -> DisplayList {
        match id {
            ThemeId::SpaceGalaxy => self.galaxy.render(inputs),
            ThemeId::MonoWave => self.mono_wave.render(inputs),
            ThemeId::NeonParticles => self.particles.render(inputs),
        }
    }
}

trait Tunables: Serialize + DeserializeOwned {
    fn sanitize(&mut self) -> bool;
}

impl Tunables for GalaxyConfig {
    fn sanitize(&mut self) -> bool {
        GalaxyConfig::sanitize(self)
    }
}

impl Tunables for MonoWaveConfig {
    fn sanitize(&mut self) -> bool {
        MonoWaveConfig::sanitize(self)
    }
}

impl Tunables for ParticlesConfig {
    fn sanitize(&mut self) -> bool {
        ParticlesConfig::sanitize(self)
    }
}

fn apply_patch<T: Tunables>(current: &mut T, id: ThemeId, patch: &Value) -> Result<()> {
    let Value::Object(changes) = patch else {
        return Err(VideoNoiseError::config(format!(
            "{id} settings must be a JSON object"
        )));
    };

    let mut merged = serde_json::to_value(&*current)?;
    let Value::Object(fields) = &mut merged else {
        return Err(VideoNoiseError::msg(format!(
            "{id} settings did not serialize to an object"
        )));
    };
    for (key, value) in changes {
        let Some(slot) = fields.get_mut(key) else {
            return Err(VideoNoiseError::config(format!("unknown {id} setting `{key}`")));
        };
        *slot = value.clone();
    }

    let mut updated: T = serde_json::from_value(merged)
        .map_err(|err| VideoNoiseError::config(format!("{id}: {err}")))?;
    if updated.sanitize() {
        tracing::warn!(theme = %id, "theme settings clamped into range");
    }
    *current = updated;
    Ok(())
}

/// Clamps a tunable into `[min, max]`; non-finite values reset to `default`.
pub(crate) fn clamp_tunable(value: &mut f32, min: f32, max: f32, default: f32) -> bool {
    let clamped = if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    };
    let changed = clamped != *value;
    *value = clamped;
    changed
}

pub(crate) fn clamp_count(value: &mut u32, min: u32, max: u32) -> bool {
    let clamped = (*value).clamp(min, max);
    let changed = clamped != *value;
    *value = clamped;
    changed
}
