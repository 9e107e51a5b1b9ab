//! Synthetic audio generation.
//!
//! Generates test signals like sine waves, white noise and drum patterns,
//! and plays them back through [`SyntheticInput`] so the engine can be
//! driven without capture hardware.

use super::input::{AudioError, AudioInput};
use std::f32::consts::PI;

/// Generate a sine wave.
///
/// # Arguments
/// * `frequency` - Frequency in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `duration` - Duration in seconds
/// * `amplitude` - Amplitude (0.0 to 1.0)
pub fn generate_sine(frequency: f32, sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Generate white noise from a seeded LCG, so runs are reproducible.
pub fn generate_white_noise(
    sample_rate: u32,
    duration: f32,
    amplitude: f32,
    seed: u64,
) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;

    let mut state = seed;
    let a: u64 = 6364136223846793005;
    let c: u64 = 1442695040888963407;

    (0..num_samples)
        .map(|_| {
            state = state.wrapping_mul(a).wrapping_add(c);
            let normalized = (state as f32 / u64::MAX as f32) * 2.0 - 1.0;
            amplitude * normalized
        })
        .collect()
}

/// Generate a bass drum hit: a 150 Hz to 50 Hz pitch drop under a fast decay.
pub fn generate_kick(sample_rate: u32) -> Vec<f32> {
    let duration = 0.15;
    let num_samples = (duration * sample_rate as f32) as usize;

    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let freq = 50.0 + 100.0 * (-t * 30.0).exp();
            let amp = (-t * 15.0).exp();
            amp * (2.0 * PI * freq * t).sin()
        })
        .collect()
}

/// Generate a 4/4 pattern: kicks on beats 1 and 3, hi-hats on every eighth.
pub fn generate_test_beat(bpm: f32, sample_rate: u32, duration: f32) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;
    let samples_per_beat = (60.0 / bpm * sample_rate as f32) as usize;
    let samples_per_16th = (samples_per_beat / 4).max(1);

    let kick = generate_kick(sample_rate);
    let hihat_samples = (sample_rate as f32 * 0.05) as usize;

    let mut samples = vec![0.0; num_samples];

    let mut pos = 0;
    let mut step = 0;

    while pos < num_samples {
        if step % 8 == 0 || step % 8 == 4 {
            for (i, &sample) in kick.iter().enumerate() {
                if pos + i < num_samples {
                    samples[pos + i] += sample * 0.8;
                }
            }
        }

        if step % 2 == 0 {
            for i in 0..hihat_samples.min(num_samples - pos) {
                let t = i as f32 / sample_rate as f32;
                let amp = (-t * 50.0).exp() * 0.3;
                let noise = ((pos + i) as f32 * 12345.67).sin();
                samples[pos + i] += amp * noise;
            }
        }

        pos += samples_per_16th;
        step += 1;
    }

    let max_val = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if max_val > 1.0 {
        for s in &mut samples {
            *s /= max_val;
        }
    }

    samples
}

/// Samples handed out per read by default, about 23 ms at 44.1 kHz.
pub const DEFAULT_CHUNK: usize = 1024;

/// Loops a pre-generated signal as if it were arriving from a device.
///
/// Each [`AudioInput::read_available`] call yields the next `chunk` samples.
#[derive(Debug, Clone)]
pub struct SyntheticInput {
    signal: Vec<f32>,
    sample_rate: u32,
    chunk: usize,
    position: usize,
    open: bool,
    available: bool,
}

impl SyntheticInput {
    pub fn new(signal: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            signal,
            sample_rate,
            chunk: DEFAULT_CHUNK,
            position: 0,
            open: false,
            available: true,
        }
    }

    /// One second of a looping sine tone.
    pub fn sine(frequency: f32, amplitude: f32, sample_rate: u32) -> Self {
        Self::new(generate_sine(frequency, sample_rate, 1.0, amplitude), sample_rate)
    }

    /// Two seconds of seeded white noise.
    pub fn noise(amplitude: f32, seed: u64, sample_rate: u32) -> Self {
        Self::new(generate_white_noise(sample_rate, 2.0, amplitude, seed), sample_rate)
    }

    /// One bar of the kick and hi-hat pattern.
    pub fn test_beat(bpm: f32, sample_rate: u32) -> Self {
        let bar = 4.0 * 60.0 / bpm.max(1.0);
        Self::new(generate_test_beat(bpm, sample_rate, bar), sample_rate)
    }

    /// An input that behaves like a machine with no capture device.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new(), 44100)
        }
    }

    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }
}

impl AudioInput for SyntheticInput {
    fn open(&mut self) -> Result<u32, AudioError> {
        if !self.available {
            return Err(AudioError::NoDevice);
        }
        self.open = true;
        self.position = 0;
        Ok(self.sample_rate)
    }

    fn read_available(&mut self, out: &mut Vec<f32>) -> usize {
        if !self.open || self.signal.is_empty() {
            return 0;
        }
        out.reserve(self.chunk);
        for _ in 0..self.chunk {
            out.push(self.signal[self.position]);
            self.position = (self.position + 1) % self.signal.len();
        }
        self.chunk
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
