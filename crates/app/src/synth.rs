//! Synthetic stereo test signal: kick drum, bass line, sustained chord and
//! hi-hat noise on the off-beats.

use std::f32::consts::TAU;

use rand::{rngs::SmallRng, Rng, SeedableRng};

const BPM: f32 = 120.0;
const BASS_NOTES: [f32; 4] = [55.0, 55.0, 65.41, 49.0];
const CHORD: [f32; 3] = [220.0, 277.18, 329.63];

pub struct TestSignal {
    sample_rate: f32,
    position: u64,
    rng: SmallRng,
}

impl TestSignal {
    pub fn new(sample_rate: u32, seed: u64) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            position: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Next `frames` stereo frames, interleaved left/right.
    pub fn next_block(&mut self, frames: usize) -> Vec<f32> {
        let mut block = Vec::with_capacity(frames * 2);
        for _ in 0..frames {
            let (left, right) = self.next_frame();
            block.push(left);
            block.push(right);
        }
        block
    }

    fn next_frame(&mut self) -> (f32, f32) {
        let t = self.position as f32 / self.sample_rate;
        self.position += 1;

        let beat = 60.0 / BPM;
        let in_beat = t % beat;
        let bar = (t / (beat * 4.0)) as usize;

        // Pitch drops from 150 Hz to 50 Hz; the sine argument is its integral.
        let kick_phase = 50.0 * in_beat + 100.0 * (1.0 - (-30.0 * in_beat).exp()) / 30.0;
        let kick = (TAU * kick_phase).sin() * (-18.0 * in_beat).exp() * 0.8;

        let bass_freq = BASS_NOTES[bar % BASS_NOTES.len()];
        let bass = (TAU * bass_freq * t).sin() * 0.25;

        let chord: f32 = CHORD.iter().map(|freq| (TAU * freq * t).sin() * 0.06).sum();

        let off_beat = (t + beat * 0.5) % beat;
        let noise: f32 = self.rng.random_range(-1.0..1.0);
        let hat = noise * (-60.0 * off_beat).exp() * 0.15;

        let mix = kick + bass + chord;
        (mix + hat * 0.6, mix + hat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_interleaved_and_bounded() {
        let mut signal = TestSignal::new(48_000, 7);
        let block = signal.next_block(800);
        assert_eq!(block.len(), 1_600);
        assert!(block.iter().all(|sample| sample.abs() <= 1.5));
        assert!(block.iter().any(|sample| sample.abs() > 0.1));
    }

    #[test]
    fn seed_makes_the_signal_repeatable() {
        let a = TestSignal::new(48_000, 3).next_block(256);
        let b = TestSignal::new(48_000, 3).next_block(256);
        assert_eq!(a, b);
    }
}
