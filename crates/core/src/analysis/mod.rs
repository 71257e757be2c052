use std::fmt;

use crate::{
    audio::{SignalGraph, BAND_FFT_SIZE, FREQUENCY_BIN_COUNT, FULL_BAND_FFT_SIZE},
    Result,
};

/// Centre of the unsigned byte sample domain.
pub const BYTE_MIDPOINT: f32 = 128.0;
/// Largest magnitude a frequency byte can hold.
pub const MAX_MAGNITUDE: f32 = 255.0;
/// The bass proxy never averages fewer bins than this.
pub const MIN_BASS_BINS: usize = 8;

/// Snapshot of every analysis tap for a single tick. Buffers are fixed-size
/// arrays so a frame lives on the stack and is dropped at the end of the tick.
#[derive(Clone, PartialEq, Eq)]
pub struct AnalysisFrame {
    pub full_time: [u8; FULL_BAND_FFT_SIZE],
    pub full_frequency: [u8; FREQUENCY_BIN_COUNT],
    pub low_time: [u8; BAND_FFT_SIZE],
    pub high_time: [u8; BAND_FFT_SIZE],
}

impl AnalysisFrame {
    /// A frame in which every tap reads silence.
    pub fn silent() -> Self {
        Self {
            full_time: [BYTE_MIDPOINT as u8; FULL_BAND_FFT_SIZE],
            full_frequency: [0; FREQUENCY_BIN_COUNT],
            low_time: [BYTE_MIDPOINT as u8; BAND_FFT_SIZE],
            high_time: [BYTE_MIDPOINT as u8; BAND_FFT_SIZE],
        }
    }

    /// Pulls the current contents of all four analysis points.
    pub fn capture(graph: &mut SignalGraph) -> Result<Self> {
        let mut frame = Self::silent();
        graph.full_tap().byte_time_domain_data(&mut frame.full_time);
        graph
            .full_tap_mut()
            .byte_frequency_data(&mut frame.full_frequency)?;
        graph.low_tap().byte_time_domain_data(&mut frame.low_time);
        graph.high_tap().byte_time_domain_data(&mut frame.high_time);
        Ok(frame)
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::from_frame(self)
    }
}

impl Default for AnalysisFrame {
    fn default() -> Self {
        Self::silent()
    }
}

impl fmt::Debug for AnalysisFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisFrame")
            .field("full_time", &self.full_time.len())
            .field("full_frequency", &self.full_frequency.len())
            .field("low_time", &self.low_time.len())
            .field("high_time", &self.high_time.len())
            .finish()
    }
}

/// Scalar drive signals derived from one [`AnalysisFrame`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    /// RMS of the full-band waveform. Not clamped.
    pub energy: f32,
    /// Normalised low-frequency magnitude in [0, 1].
    pub bass_glow: f32,
}

impl Metrics {
    pub fn from_frame(frame: &AnalysisFrame) -> Self {
        Self {
            energy: energy(&frame.full_time),
            bass_glow: bass_glow(&frame.full_frequency),
        }
    }
}

/// Maps a raw byte sample onto the signed range around the midpoint.
pub fn normalize_sample(raw: u8) -> f32 {
    (raw as f32 - BYTE_MIDPOINT) / BYTE_MIDPOINT
}

/// Root-mean-square of the normalised samples; zero for an empty buffer.
pub fn energy(time_domain: &[u8]) -> f32 {
    if time_domain.is_empty() {
        return 0.0;
    }

    let sum: f32 = time_domain
        .iter()
        .map(|&raw| {
            let sample = normalize_sample(raw);
            sample * sample
        })
        .sum();
    (sum / time_domain.len() as f32).sqrt()
}

/// Average of the lowest eighth of the bins (at least [`MIN_BASS_BINS`],
/// never more than exist) relative to [`MAX_MAGNITUDE`], clamped to [0, 1].
pub fn bass_glow(frequency: &[u8]) -> f32 {
    let bins = (frequency.len() / 8).max(MIN_BASS_BINS).min(frequency.len());
    if bins == 0 {
        return 0.0;
    }

    let sum: f32 = frequency[..bins].iter().map(|&magnitude| magnitude as f32).sum();
    (sum / bins as f32 / MAX_MAGNITUDE).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_1_SQRT_2, PI};

    use proptest::prelude::*;

    use super::*;
    use crate::{
        audio::{AudioContext, NullSink, SourceHandle, SourceId},
        config::AudioConfig,
    };

    fn sine_bytes(amplitude: f32, len: usize) -> Vec<u8> {
        (0..len)
            .map(|n| {
                let x = amplitude * (2.0 * PI * 8.0 * n as f32 / len as f32).sin();
                (BYTE_MIDPOINT + x * BYTE_MIDPOINT).round().clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    #[test]
    fn silent_buffer_has_zero_energy() {
        assert_eq!(energy(&[128; FULL_BAND_FFT_SIZE]), 0.0);
        assert_eq!(energy(&[]), 0.0);
    }

    #[test]
    fn sine_energy_matches_rms() {
        for amplitude in [0.1, 0.5, 0.9] {
            let measured = energy(&sine_bytes(amplitude, FULL_BAND_FFT_SIZE));
            let expected = amplitude * FRAC_1_SQRT_2;
            assert!(
                (measured - expected).abs() < 0.01,
                "amplitude {amplitude}: {measured} vs {expected}"
            );
        }
    }

    #[test]
    fn full_negative_scale_reaches_one() {
        assert_eq!(energy(&[0; 64]), 1.0);
    }

    #[test]
    fn bass_glow_bounds() {
        assert_eq!(bass_glow(&[0; FREQUENCY_BIN_COUNT]), 0.0);
        assert_eq!(bass_glow(&[255; FREQUENCY_BIN_COUNT]), 1.0);
        assert_eq!(bass_glow(&[]), 0.0);
    }

    #[test]
    fn bass_glow_reads_only_the_lowest_eighth() {
        let mut bins = [0u8; FREQUENCY_BIN_COUNT];
        bins[..FREQUENCY_BIN_COUNT / 8].fill(255);
        assert_eq!(bass_glow(&bins), 1.0);

        let mut bins = [255u8; FREQUENCY_BIN_COUNT];
        bins[..FREQUENCY_BIN_COUNT / 8].fill(0);
        assert_eq!(bass_glow(&bins), 0.0);
    }

    #[test]
    fn bass_glow_uses_at_least_eight_bins() {
        let mut bins = [0u8; 32];
        bins[..4].fill(255);
        assert!((bass_glow(&bins) - 0.5).abs() < 1e-6);

        // Fewer bins than the minimum: average what exists.
        assert_eq!(bass_glow(&[255, 255, 255]), 1.0);
    }

    #[test]
    fn captures_fixed_size_buffers() {
        let config = AudioConfig::default();
        let mut context = AudioContext::new(48_000, Box::new(NullSink)).unwrap();
        let source = SourceHandle::new(SourceId::new(1), 2, 48_000);
        let mut graph = crate::audio::SignalGraph::build(&mut context, source, &config).unwrap();

        let block: Vec<f32> = (0..4096)
            .flat_map(|n| {
                let x = 0.6 * (2.0 * PI * 80.0 * n as f32 / 48_000.0).sin();
                [x, x]
            })
            .collect();
        graph.process(&mut context, &block).unwrap();

        let frame = AnalysisFrame::capture(&mut graph).unwrap();
        let metrics = frame.metrics();
        assert!((metrics.energy - 0.6 * FRAC_1_SQRT_2).abs() < 0.02);
        assert!(metrics.bass_glow > 0.0);
        assert!(frame.low_time.iter().any(|&byte| byte != 128));
    }

    proptest! {
        #[test]
        fn bass_glow_stays_in_unit_range(bins in prop::collection::vec(any::<u8>(), 0..2048)) {
            let glow = bass_glow(&bins);
            prop_assert!((0.0..=1.0).contains(&glow));
        }

        #[test]
        fn energy_is_finite_and_bounded(samples in prop::collection::vec(any::<u8>(), 0..2048)) {
            let value = energy(&samples);
            prop_assert!(value.is_finite());
            prop_assert!(value >= 0.0 && value <= 1.0);
        }
    }
}
