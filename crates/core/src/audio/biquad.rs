//! Second-order IIR filters used to split the signal into bands.
//!
//! Coefficients follow the audio EQ cookbook formulas and are normalised by
//! `a0`, so [`Biquad::process`] runs a plain direct form I difference
//! equation.

use std::f32::consts::PI;

/// Response shape of a [`Biquad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coefficients {
    fn new(kind: FilterKind, sample_rate: u32, cutoff_hz: f32, q: f32) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate as f32;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::LowPass => {
                let b = (1.0 - cos_w0) * 0.5;
                (b, 1.0 - cos_w0, b)
            }
            FilterKind::HighPass => {
                let b = (1.0 + cos_w0) * 0.5;
                (b, -(1.0 + cos_w0), b)
            }
        };
        let a0 = 1.0 + alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct FilterState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

/// Mono biquad filter with its own delay line.
#[derive(Debug, Clone)]
pub struct Biquad {
    coefficients: Coefficients,
    state: FilterState,
}

impl Biquad {
    pub fn new(kind: FilterKind, sample_rate: u32, cutoff_hz: f32, q: f32) -> Self {
        Self {
            coefficients: Coefficients::new(kind, sample_rate, cutoff_hz, q),
            state: FilterState::default(),
        }
    }

    pub fn low_pass(sample_rate: u32, cutoff_hz: f32, q: f32) -> Self {
        Self::new(FilterKind::LowPass, sample_rate, cutoff_hz, q)
    }

    pub fn high_pass(sample_rate: u32, cutoff_hz: f32, q: f32) -> Self {
        Self::new(FilterKind::HighPass, sample_rate, cutoff_hz, q)
    }

    /// Clears the delay line without touching the coefficients.
    pub fn reset(&mut self) {
        self.state = FilterState::default();
    }

    pub fn process(&mut self, x: f32) -> f32 {
        // Keep a NaN from poisoning the delay line forever.
        let x = if x.is_finite() { x } else { 0.0 };
        let c = self.coefficients;
        let s = &mut self.state;
        let y = c.b0 * x + c.b1 * s.x1 + c.b2 * s.x2 - c.a1 * s.y1 - c.a2 * s.y2;

        s.x2 = s.x1;
        s.x1 = x;
        s.y2 = s.y1;
        s.y1 = y;
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 48_000;

    /// Steady-state RMS gain of the filter for a unit sine at `freq`.
    fn gain_at(filter: &mut Biquad, freq: f32) -> f32 {
        let total = RATE as usize / 2;
        let settle = total / 2;
        let mut sum = 0.0;
        for n in 0..total {
            let x = (2.0 * PI * freq * n as f32 / RATE as f32).sin();
            let y = filter.process(x);
            if n >= settle {
                sum += y * y;
            }
        }
        let rms = (sum / (total - settle) as f32).sqrt();
        rms / std::f32::consts::FRAC_1_SQRT_2
    }

    #[test]
    fn low_pass_keeps_bass_and_drops_treble() {
        let mut filter = Biquad::low_pass(RATE, 250.0, 0.707);
        assert!(gain_at(&mut filter, 50.0) > 0.9);
        filter.reset();
        assert!(gain_at(&mut filter, 5_000.0) < 0.05);
    }

    #[test]
    fn high_pass_keeps_treble_and_drops_bass() {
        let mut filter = Biquad::high_pass(RATE, 2_000.0, 0.707);
        assert!(gain_at(&mut filter, 10_000.0) > 0.9);
        filter.reset();
        assert!(gain_at(&mut filter, 100.0) < 0.05);
    }

    #[test]
    fn cutoff_sits_near_minus_three_db() {
        let mut filter = Biquad::low_pass(RATE, 250.0, 0.707);
        let gain = gain_at(&mut filter, 250.0);
        assert!((gain - 0.707).abs() < 0.05, "gain was {gain}");
    }

    #[test]
    fn recovers_from_non_finite_input() {
        let mut filter = Biquad::high_pass(RATE, 2_000.0, 0.707);
        filter.process(f32::NAN);
        assert_eq!(filter.process(0.0), 0.0);
    }
}
