use std::f32::consts::TAU;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{clamp_count, clamp_tunable, FrameInputs, Theme};
use crate::render::{
    Color, DisplayList, DrawCommand, Glow, GradientStop, GradientStops, Path, Point, Size,
};

const ARMS: usize = 3;
const ARM_STEP: f32 = 0.12;
const ARM_OFFSET: f32 = 2.1;
const MIN_PLANET_GLOW: f32 = 6.0;
const MAX_PLANET_GLOW: f32 = 28.0;
const BASE_STARS: usize = 70;
const BURST_STARS: f32 = 120.0;
const MAX_STARS: usize = 2_000;

/// Space galaxy tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalaxyConfig {
    /// Orbit speed multiplier.
    pub speed: f32,
    pub planet_scale: f32,
    pub rings: u32,
    pub planets_per_ring: u32,
    /// How strongly bass drives the planet halo.
    pub glow_intensity: f32,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            planet_scale: 1.0,
            rings: 5,
            planets_per_ring: 6,
            glow_intensity: 0.75,
        }
    }
}

impl GalaxyConfig {
    pub fn sanitize(&mut self) -> bool {
        let defaults = Self::default();
        [
            clamp_tunable(&mut self.speed, 0.2, 3.0, defaults.speed),
            clamp_tunable(&mut self.planet_scale, 0.5, 2.5, defaults.planet_scale),
            clamp_count(&mut self.rings, 1, 12),
            clamp_count(&mut self.planets_per_ring, 1, 16),
            clamp_tunable(&mut self.glow_intensity, 0.0, 1.0, defaults.glow_intensity),
        ]
        .contains(&true)
    }

    fn draw_core(&self, center: Point, core_radius: f32, frame: &mut DisplayList) {
        frame.push(DrawCommand::RadialGradient {
            center,
            radius: core_radius * 3.0,
            stops: GradientStops::new(&[
                GradientStop::new(0.0, Color::rgba8(255, 235, 190, 0.9)),
                GradientStop::new(0.35, Color::rgba8(255, 160, 120, 0.35)),
                GradientStop::new(1.0, Color::TRANSPARENT),
            ]),
            glow: None,
        });
    }

    fn draw_arms(&self, center: Point, core_radius: f32, min_side: f32, frame: &mut DisplayList) {
        let steps = (TAU / ARM_STEP).ceil() as usize;
        for arm in 0..ARMS {
            let offset = arm as f32 * ARM_OFFSET;
            let points: Vec<Point> = (0..steps)
                .map(|step| {
                    let angle = step as f32 * ARM_STEP;
                    let radius = core_radius * 0.6 + angle * (min_side * 0.06);
                    Point::new(
                        center.x + (angle + offset).cos() * radius,
                        center.y + (angle + offset).sin() * radius,
                    )
                })
                .collect();
            frame.push(DrawCommand::StrokePath {
                path: Path::polyline(&points),
                width: 2.0,
                color: Color::rgba8(180, 200, 255, 0.15),
                glow: None,
            });
        }
    }

    fn draw_orbits(
        &self,
        inputs: &FrameInputs<'_>,
        center: Point,
        core_radius: f32,
        frame: &mut DisplayList,
    ) {
        let min_side = inputs.size.min_side();
        let rings = self.rings.clamp(1, 12);
        let per_ring = self.planets_per_ring.clamp(1, 16);
        let halo = Glow {
            color: Color::rgba8(150, 180, 255, 0.9),
            blur: MIN_PLANET_GLOW
                + (MAX_PLANET_GLOW - MIN_PLANET_GLOW) * inputs.bass_glow() * self.glow_intensity,
        };

        for ring in 1..=rings {
            let ring_f = ring as f32;
            let orbit = core_radius * 1.5 + ring_f * (min_side * 0.09);
            frame.push(DrawCommand::StrokeCircle {
                center,
                radius: orbit,
                width: 1.0,
                color: Color::rgba8(255, 255, 255, 0.06),
            });

            let speed = (0.1 + ring_f * 0.03) * self.speed;
            let hue = 220.0 + ring_f * 12.0;
            let lightness = 55.0 - ring_f * 6.0;
            let radius = ((4.0 + ring_f * 1.2) * self.planet_scale).max(2.0);

            for planet in 0..per_ring {
                let angle = inputs.elapsed * speed + planet as f32 / per_ring as f32 * TAU;
                let position = Point::new(
                    center.x + angle.cos() * orbit,
                    center.y + angle.sin() * orbit,
                );

                frame.push(DrawCommand::RadialGradient {
                    center: position,
                    radius: radius * 2.4,
                    stops: GradientStops::new(&[
                        GradientStop::new(0.0, Color::hsla(hue, 100.0, lightness, 0.9)),
                        GradientStop::new(1.0, Color::TRANSPARENT),
                    ]),
                    glow: Some(halo),
                });
                frame.push(DrawCommand::FillCircle {
                    center: position,
                    radius,
                    color: Color::hsla(hue, 70.0, lightness, 1.0),
                });
            }
        }
    }

    /// Star positions come from an RNG seeded by the frame time, so a given
    /// instant always scatters the same way.
    fn draw_stars(&self, inputs: &FrameInputs<'_>, frame: &mut DisplayList) {
        let Size { width, height } = inputs.size;
        let count = (BASE_STARS + (inputs.peak() * BURST_STARS) as usize).min(MAX_STARS);
        let mut rng = SmallRng::seed_from_u64(u64::from(inputs.elapsed.to_bits()));
        let color = Color::rgba8(255, 255, 255, 0.8);

        for _ in 0..count {
            let x = (rng.random::<f32>() * width).floor();
            let y = (rng.random::<f32>() * height).floor();
            frame.push(DrawCommand::FillRect {
                origin: Point::new(x, y),
                size: Size::new(1.0, 1.0),
                color,
            });
        }
    }
}

impl Theme for GalaxyConfig {
    fn background(&self) -> Color {
        Color::rgb8(0x05, 0x06, 0x0a)
    }

    fn draw(&self, inputs: &FrameInputs<'_>, frame: &mut DisplayList) {
        let center = inputs.size.center();
        let min_side = inputs.size.min_side();
        let core_radius = min_side * (0.08 + inputs.peak() * 0.04);

        self.draw_core(center, core_radius, frame);
        self.draw_arms(center, core_radius, min_side, frame);
        self.draw_orbits(inputs, center, core_radius, frame);
        self.draw_stars(inputs, frame);
    }
}
