use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{config::AudioConfig, Result, VideoNoiseError};

/// Analysis point that records the most recent `fft_size` mono samples
/// flowing through it. Reading never alters the audio path.
pub struct AnalysisTap {
    fft_size: usize,
    ring: Vec<f32>,
    write_pos: usize,
    spectrum: Option<SpectrumState>,
}

impl AnalysisTap {
    /// Creates a tap that only exposes time-domain data.
    pub fn time_domain(fft_size: usize) -> Self {
        Self {
            fft_size,
            ring: vec![0.0; fft_size],
            write_pos: 0,
            spectrum: None,
        }
    }

    /// Creates a tap that exposes both time-domain and frequency-domain data.
    pub fn with_spectrum(fft_size: usize, config: &AudioConfig) -> Self {
        let mut tap = Self::time_domain(fft_size);
        tap.spectrum = Some(SpectrumState::new(fft_size, config));
        tap
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of magnitude bins, zero for time-domain only taps.
    pub fn frequency_bin_count(&self) -> usize {
        if self.spectrum.is_some() {
            self.fft_size / 2
        } else {
            0
        }
    }

    pub fn has_spectrum(&self) -> bool {
        self.spectrum.is_some()
    }

    pub fn push(&mut self, sample: f32) {
        if self.ring.is_empty() {
            return;
        }
        self.ring[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.ring.len();
    }

    /// Recorded samples from oldest to newest.
    fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        let (newest, oldest) = self.ring.split_at(self.write_pos);
        oldest.iter().chain(newest.iter()).copied()
    }

    /// Writes the waveform as unsigned bytes centred on 128.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        for (slot, sample) in out.iter_mut().zip(self.samples()) {
            *slot = (128.0 * (sample + 1.0)).floor().clamp(0.0, 255.0) as u8;
        }
    }

    /// Writes smoothed magnitudes as bytes spanning the configured decibel
    /// range. Each call advances the temporal smoothing by one step.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) -> Result<()> {
        let Self {
            ring,
            write_pos,
            spectrum,
            ..
        } = self;
        let spectrum = spectrum
            .as_mut()
            .ok_or_else(|| VideoNoiseError::msg("tap was built without frequency analysis"))?;

        let (newest, oldest) = ring.split_at(*write_pos);
        let ordered = oldest.iter().chain(newest.iter());
        for ((slot, sample), weight) in spectrum
            .fft
            .input
            .iter_mut()
            .zip(ordered)
            .zip(spectrum.window.iter())
        {
            *slot = sample * weight;
        }

        spectrum.update()?;

        let range = spectrum.max_decibels - spectrum.min_decibels;
        for (slot, magnitude) in out.iter_mut().zip(spectrum.smoothed.iter()) {
            let decibels = 20.0 * magnitude.log10();
            let scaled = (decibels - spectrum.min_decibels) * 255.0 / range;
            // log10(0) is -inf, which the clamp maps to zero.
            *slot = if scaled.is_nan() {
                0
            } else {
                scaled.floor().clamp(0.0, 255.0) as u8
            };
        }

        Ok(())
    }
}

impl fmt::Debug for AnalysisTap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisTap")
            .field("fft_size", &self.fft_size)
            .field("write_pos", &self.write_pos)
            .field("spectrum", &self.spectrum.is_some())
            .finish()
    }
}

struct SpectrumState {
    fft: FftResources,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    smoothing_time_constant: f32,
    min_decibels: f32,
    max_decibels: f32,
}

impl SpectrumState {
    fn new(fft_size: usize, config: &AudioConfig) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(fft_size);
        let fft = FftResources {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        };

        Self {
            fft,
            window: (0..fft_size).map(|n| blackman_value(n, fft_size)).collect(),
            smoothed: vec![0.0; fft_size / 2],
            smoothing_time_constant: config.smoothing_time_constant,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
        }
    }

    /// Transforms the windowed input and folds it into the smoothed bins.
    fn update(&mut self) -> Result<()> {
        let fft = &mut self.fft;
        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let scale = 1.0 / fft.input.len().max(1) as f32;
        let tau = self.smoothing_time_constant;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(fft.spectrum.iter()) {
            let magnitude = bin.norm() * scale;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }

        Ok(())
    }
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

fn blackman_value(index: usize, len: usize) -> f32 {
    const ALPHA: f32 = 0.16;
    let a0 = 0.5 * (1.0 - ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * ALPHA;
    let phase = 2.0 * PI * index as f32 / len.max(1) as f32;

    a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
}
