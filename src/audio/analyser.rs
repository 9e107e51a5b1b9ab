//! Smoothed frequency analysis using RustFFT.
//!
//! Keeps the most recent `fft_size` samples and turns them into byte
//! magnitude bins on demand, the way a browser analyser node does: Hann
//! window, magnitude over N, exponential smoothing across refreshes, then
//! decibels mapped linearly from `[min_decibels, max_decibels]` to `0..=255`.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Analyser tuning, mirrored from the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserSettings {
    pub fft_size: usize,
    /// Weight of the previous frame in `[0, 1)`.
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

pub struct FrequencyAnalyser {
    settings: AnalyserSettings,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    history: Vec<f32>,
    write_pos: usize,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bins: Vec<u8>,
}

impl FrequencyAnalyser {
    /// Create an analyser.
    ///
    /// # Panics
    ///
    /// Panics if `settings.fft_size` is not a power of two of at least 32.
    pub fn new(settings: AnalyserSettings) -> Self {
        let fft_size = settings.fft_size;
        assert!(
            fft_size.is_power_of_two() && fft_size >= 32,
            "FFT size must be a power of 2 no smaller than 32"
        );

        // Hann window reduces spectral leakage
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let t = i as f32 / fft_size as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        Self {
            settings,
            fft,
            window,
            history: vec![0.0; fft_size],
            write_pos: 0,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            bins: vec![0; fft_size / 2],
        }
    }

    pub fn settings(&self) -> &AnalyserSettings {
        &self.settings
    }

    pub fn fft_size(&self) -> usize {
        self.settings.fft_size
    }

    /// Number of frequency bins (FFT size / 2).
    pub fn num_bins(&self) -> usize {
        self.settings.fft_size / 2
    }

    /// Append mono samples; only the newest `fft_size` are kept.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let n = self.history.len();
        let samples = &samples[samples.len().saturating_sub(n)..];
        for &s in samples {
            self.history[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % n;
        }
    }

    /// Recompute the byte bins from the current sample window.
    pub fn refresh(&mut self) -> &[u8] {
        let n = self.history.len();

        // Oldest sample first
        for i in 0..n {
            let s = self.history[(self.write_pos + i) % n];
            self.scratch[i] = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let AnalyserSettings {
            smoothing,
            min_decibels,
            max_decibels,
            ..
        } = self.settings;
        let range = (max_decibels - min_decibels).max(f32::EPSILON);

        for (k, (smoothed, bin)) in self.smoothed.iter_mut().zip(&mut self.bins).enumerate() {
            let magnitude = self.scratch[k].norm() / n as f32;
            *smoothed = smoothing * *smoothed + (1.0 - smoothing) * magnitude;

            let db = 20.0 * smoothed.max(1e-10).log10();
            let scaled = 255.0 * (db - min_decibels) / range;
            *bin = scaled.floor().clamp(0.0, 255.0) as u8;
        }

        &self.bins
    }

    /// Byte bins from the last refresh.
    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    /// Forget all history and smoothing state.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.write_pos = 0;
        self.smoothed.fill(0.0);
        self.bins.fill(0);
    }

    /// Get the frequency in Hz for a given bin index.
    pub fn bin_to_freq(&self, bin: usize, sample_rate: u32) -> f32 {
        bin as f32 * sample_rate as f32 / self.settings.fft_size as f32
    }

    /// Index of the loudest bin of the last refresh, `None` if all are silent.
    pub fn peak_bin(&self) -> Option<usize> {
        self.bins
            .iter()
            .enumerate()
            .filter(|(_, &b)| b > 0)
            .max_by_key(|(_, &b)| b)
            .map(|(i, _)| i)
    }
}
