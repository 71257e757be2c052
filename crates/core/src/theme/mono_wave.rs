use serde::{Deserialize, Serialize};

use super::{clamp_tunable, palette, FrameInputs, Theme};
use crate::{
    conditioning::trace_path,
    render::{Color, DisplayList, DrawCommand, Glow, Point},
};

const MIN_GLOW: f32 = 4.0;
const MAX_GLOW: f32 = 20.0;
/// The high band's halo is drawn at this share of the low band's.
const HIGH_GLOW_SHARE: f32 = 0.8;

/// Dual-band waveform tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonoWaveConfig {
    /// EMA amount in [0, 1]; 0 leaves the waveform untouched.
    pub smoothness: f32,
    pub wave_height: f32,
    /// Larger values keep more samples per path.
    pub wave_length: f32,
    pub line_thickness: f32,
    /// Smooth curves with glow instead of raw straight segments.
    pub clean_mode: bool,
    pub glow_intensity: f32,
    pub palette: String,
}

impl Default for MonoWaveConfig {
    fn default() -> Self {
        Self {
            smoothness: 0.25,
            wave_height: 1.2,
            wave_length: 1.0,
            line_thickness: 3.0,
            clean_mode: true,
            glow_intensity: 0.8,
            palette: "neon".to_string(),
        }
    }
}

impl MonoWaveConfig {
    pub fn sanitize(&mut self) -> bool {
        let defaults = Self::default();
        [
            clamp_tunable(&mut self.smoothness, 0.0, 1.0, defaults.smoothness),
            clamp_tunable(&mut self.wave_height, 0.5, 3.0, defaults.wave_height),
            clamp_tunable(&mut self.wave_length, 0.5, 3.0, defaults.wave_length),
            clamp_tunable(&mut self.line_thickness, 1.0, 7.0, defaults.line_thickness),
            clamp_tunable(&mut self.glow_intensity, 0.0, 1.0, defaults.glow_intensity),
        ]
        .contains(&true)
    }

    pub fn palette(&self) -> palette::Palette {
        palette::lookup(Some(&self.palette))
    }

    /// `false` when the stored id draws with the fallback palette.
    pub fn has_known_palette(&self) -> bool {
        palette::find(&self.palette).is_some()
    }

    fn stroke(
        &self,
        points: &[Point],
        width: f32,
        color: Color,
        blur: f32,
        frame: &mut DisplayList,
    ) {
        let path = trace_path(points, self.clean_mode);
        if path.is_empty() {
            return;
        }
        frame.push(DrawCommand::StrokePath {
            path,
            width,
            color,
            glow: self.clean_mode.then_some(Glow { color, blur }),
        });
    }
}

impl Theme for MonoWaveConfig {
    fn background(&self) -> Color {
        Color::BLACK
    }

    fn draw(&self, inputs: &FrameInputs<'_>, frame: &mut DisplayList) {
        let Some(bands) = inputs.bands else {
            return;
        };

        let palette = self.palette();
        let glow = MIN_GLOW + (MAX_GLOW - MIN_GLOW) * inputs.bass_glow() * self.glow_intensity;

        self.stroke(&bands.low, self.line_thickness, palette.low(), glow, frame);
        self.stroke(
            &bands.high,
            (self.line_thickness - 1.0).max(1.0),
            palette.high(),
            glow * HIGH_GLOW_SHARE,
            frame,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::Metrics, conditioning::BandWaves, render::Size};

    fn bands() -> BandWaves {
        let line = |y: f32| (0..8).map(|i| Point::new(i as f32 * 10.0, y)).collect();
        BandWaves {
            low: line(40.0),
            high: line(60.0),
        }
    }

    fn inputs(bands: Option<&BandWaves>, bass_glow: f32) -> FrameInputs<'_> {
        FrameInputs {
            metrics: Metrics {
                energy: 0.2,
                bass_glow,
            },
            elapsed: 0.0,
            size: Size::new(70.0, 100.0),
            bands,
        }
    }

    fn strokes(frame: &DisplayList) -> Vec<(f32, Color, Option<Glow>)> {
        frame
            .iter()
            .filter_map(|command| match command {
                DrawCommand::StrokePath {
                    width, color, glow, ..
                } => Some((*width, *color, *glow)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn no_bands_draws_background_only() {
        let frame = MonoWaveConfig::default().render(&inputs(None, 1.0));
        assert_eq!(frame.commands(), &[DrawCommand::Clear(Color::BLACK)]);
    }

    #[test]
    fn two_strokes_in_palette_colours() {
        let bands = bands();
        let config = MonoWaveConfig::default();
        let drawn = strokes(&config.render(&inputs(Some(&bands), 1.0)));
        let neon = palette::lookup(Some("neon"));

        assert_eq!(drawn.len(), 2);
        assert_eq!((drawn[0].0, drawn[0].1), (3.0, neon.low()));
        assert_eq!((drawn[1].0, drawn[1].1), (2.0, neon.high()));

        let low_blur = drawn[0].2.unwrap().blur;
        let high_blur = drawn[1].2.unwrap().blur;
        assert!((low_blur - (4.0 + 16.0 * 0.8)).abs() < 1e-4);
        assert!((high_blur - low_blur * 0.8).abs() < 1e-4);
    }

    #[test]
    fn raw_mode_has_no_glow_and_thin_floor() {
        let bands = bands();
        let config = MonoWaveConfig {
            clean_mode: false,
            line_thickness: 1.0,
            ..MonoWaveConfig::default()
        };
        let drawn = strokes(&config.render(&inputs(Some(&bands), 1.0)));
        assert!(drawn.iter().all(|(_, _, glow)| glow.is_none()));
        assert_eq!(drawn[1].0, 1.0);
    }

    #[test]
    fn unknown_palette_falls_back() {
        let bands = bands();
        let config = MonoWaveConfig {
            palette: "nope".to_string(),
            ..MonoWaveConfig::default()
        };
        let drawn = strokes(&config.render(&inputs(Some(&bands), 0.0)));
        assert_eq!(drawn[0].1, palette::DEFAULT_PALETTE.low());
        assert_eq!(drawn[0].2.unwrap().blur, MIN_GLOW);
    }

    #[test]
    fn empty_bands_skip_strokes() {
        let empty = BandWaves::default();
        let frame = MonoWaveConfig::default().render(&inputs(Some(&empty), 0.5));
        assert_eq!(frame.len(), 1);
    }
}
