use serde::{Deserialize, Serialize};

use super::{clamp_count, clamp_tunable, FrameInputs, Theme};
use crate::render::{Color, DisplayList, DrawCommand, Point};

const MAX_PARTICLES: u32 = 2_048;

/// Neon particle tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticlesConfig {
    /// Dots drawn at silence.
    pub base_count: u32,
    /// Extra dots added per unit of energy.
    pub burst_count: u32,
    pub speed: f32,
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        Self {
            base_count: 160,
            burst_count: 200,
            speed: 1.0,
        }
    }
}

impl ParticlesConfig {
    pub fn sanitize(&mut self) -> bool {
        [
            clamp_count(&mut self.base_count, 0, MAX_PARTICLES),
            clamp_count(&mut self.burst_count, 0, MAX_PARTICLES),
            clamp_tunable(&mut self.speed, 0.2, 3.0, 1.0),
        ]
        .contains(&true)
    }

    /// Number of dots for a given energy, capped at twice the config limit.
    pub fn count(&self, peak: f32) -> usize {
        let burst = (peak * self.burst_count as f32) as u32;
        self.base_count.saturating_add(burst).min(MAX_PARTICLES * 2) as usize
    }
}

/// Position of dot `index` at time `t` on a `width` by `height` area.
fn position(index: usize, t: f32, width: f32, height: f32) -> Point {
    let i = index as f32;
    Point::new(
        ((i * 53.1 + t * 0.8).sin() * 0.5 + 0.5) * width,
        ((i * 71.7 + t * 0.6).cos() * 0.5 + 0.5) * height,
    )
}

impl Theme for ParticlesConfig {
    fn background(&self) -> Color {
        Color::rgb8(0x04, 0x06, 0x0a)
    }

    fn draw(&self, inputs: &FrameInputs<'_>, frame: &mut DisplayList) {
        let peak = inputs.peak();
        let t = inputs.elapsed * self.speed;

        for index in 0..self.count(peak) {
            frame.push(DrawCommand::FillCircle {
                center: position(index, t, inputs.size.width, inputs.size.height),
                radius: 1.0 + (index % 5) as f32 + peak * 3.0,
                color: Color::hsla(
                    ((index * 7) % 360) as f32,
                    100.0,
                    65.0,
                    0.2 + (index % 3) as f32 * 0.05,
                ),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::Metrics, render::Size};

    fn inputs(energy: f32, elapsed: f32) -> FrameInputs<'static> {
        FrameInputs {
            metrics: Metrics {
                energy,
                bass_glow: 0.0,
            },
            elapsed,
            size: Size::new(320.0, 240.0),
            bands: None,
        }
    }

    fn circles(frame: &DisplayList) -> Vec<(Point, f32)> {
        frame
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillCircle { center, radius, .. } => Some((*center, *radius)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn count_follows_energy() {
        let config = ParticlesConfig::default();
        assert_eq!(circles(&config.render(&inputs(0.0, 1.0))).len(), 160);
        assert_eq!(circles(&config.render(&inputs(0.5, 1.0))).len(), 260);
        assert_eq!(config.count(1_000.0), (MAX_PARTICLES * 2) as usize);
    }

    #[test]
    fn positions_are_a_function_of_index_and_time() {
        let config = ParticlesConfig::default();
        let first = circles(&config.render(&inputs(0.3, 4.2)));
        let again = circles(&config.render(&inputs(0.3, 4.2)));
        assert_eq!(first, again);

        let later = circles(&config.render(&inputs(0.3, 4.7)));
        assert_ne!(first[0].0, later[0].0);

        for (center, _) in &first {
            assert!((0.0..=320.0).contains(&center.x));
            assert!((0.0..=240.0).contains(&center.y));
        }
    }

    #[test]
    fn radius_grows_with_energy() {
        let config = ParticlesConfig::default();
        let quiet = circles(&config.render(&inputs(0.0, 0.0)));
        let loud = circles(&config.render(&inputs(1.0, 0.0)));
        assert_eq!(quiet[0].1, 1.0);
        assert_eq!(loud[0].1, 4.0);
        assert_eq!(quiet[4].1, 5.0);
    }
}
