//! Turns raw band waveforms into stable point sequences and display paths.

use crate::{
    analysis::{normalize_sample, AnalysisFrame},
    audio::BAND_FFT_SIZE,
    render::{Path, Point, Size},
    theme::MonoWaveConfig,
};

/// Largest EMA window reachable with `smoothness = 1`.
pub const MAX_SMOOTHING_WINDOW: f32 = 256.0;
/// Floor for the high band's height factor.
pub const MIN_HIGH_BAND_HEIGHT: f32 = 0.6;
/// The high band is drawn at this share of the configured wave height.
pub const HIGH_BAND_HEIGHT_RATIO: f32 = 0.7;

/// Maps raw bytes to signed samples around the midpoint, writing as many as
/// both slices hold.
pub fn normalize_into(raw: &[u8], out: &mut [f32]) {
    for (sample, &byte) in out.iter_mut().zip(raw) {
        *sample = normalize_sample(byte);
    }
}

/// EMA window length for a smoothness in [0, 1].
pub fn smoothing_window(smoothness: f32) -> u32 {
    let smoothness = if smoothness.is_finite() {
        smoothness.clamp(0.0, 1.0)
    } else {
        0.0
    };
    1 + (smoothness * MAX_SMOOTHING_WINDOW).round() as u32
}

pub fn smoothing_alpha(smoothness: f32) -> f32 {
    2.0 / (smoothing_window(smoothness) as f32 + 1.0)
}

/// Single causal left-to-right pass seeded with the first sample.
pub fn ema_smooth(samples: &mut [f32], alpha: f32) {
    let Some(&first) = samples.first() else {
        return;
    };

    let mut prev = first;
    for sample in samples.iter_mut() {
        prev = alpha * *sample + (1.0 - alpha) * prev;
        *sample = prev;
    }
}

/// Sample stride for a wave length; unusable lengths draw every sample.
pub fn stride(wave_length: f32) -> usize {
    if !(wave_length.is_finite() && wave_length > 0.0) {
        return 1;
    }
    let stride = (1.0 / wave_length).round();
    if stride.is_finite() && stride >= 1.0 {
        stride as usize
    } else {
        1
    }
}

/// Every `stride`-th sample placed across the surface width, offset from the
/// vertical midpoint by `sample * height / 3 * height_factor`.
pub fn waveform_points(
    samples: &[f32],
    stride: usize,
    size: Size,
    height_factor: f32,
) -> Vec<Point> {
    let len = samples.len();
    let span = len.saturating_sub(1) as f32;
    let mid = size.height * 0.5;
    let scale = size.height / 3.0 * height_factor;

    samples
        .iter()
        .enumerate()
        .step_by(stride.max(1))
        .map(|(i, &sample)| {
            let x = if span > 0.0 {
                i as f32 / span * size.width
            } else {
                0.0
            };
            Point::new(x, mid + sample * scale)
        })
        .collect()
}

/// Conditioned point sequences for both bands of one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandWaves {
    pub low: Vec<Point>,
    pub high: Vec<Point>,
}

fn condition_band(
    raw: &[u8; BAND_FFT_SIZE],
    config: &MonoWaveConfig,
    size: Size,
    height_factor: f32,
) -> Vec<Point> {
    let mut samples = [0.0; BAND_FFT_SIZE];
    normalize_into(raw, &mut samples);
    if config.clean_mode {
        ema_smooth(&mut samples, smoothing_alpha(config.smoothness));
    }
    waveform_points(&samples, stride(config.wave_length), size, height_factor)
}

/// Conditions the low and high band waveforms of `frame` for drawing.
pub fn condition_bands(frame: &AnalysisFrame, config: &MonoWaveConfig, size: Size) -> BandWaves {
    let high_factor = (config.wave_height * HIGH_BAND_HEIGHT_RATIO).max(MIN_HIGH_BAND_HEIGHT);
    BandWaves {
        low: condition_band(&frame.low_time, config, size, config.wave_height),
        high: condition_band(&frame.high_time, config, size, high_factor),
    }
}

/// Display path through `points`. Clean mode bends through each interior
/// point towards the midpoint of it and its successor; otherwise straight
/// segments are used.
pub fn trace_path(points: &[Point], clean: bool) -> Path {
    if !clean {
        return Path::polyline(points);
    }

    let mut path = Path::with_capacity(points.len());
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return path;
    };
    if points.len() < 2 {
        return path;
    }

    path.move_to(first);
    for pair in points[1..].windows(2) {
        path.quad_to(pair[0], pair[0].midpoint(pair[1]));
    }
    path.line_to(last);
    path
}
