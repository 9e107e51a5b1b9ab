//! Live feature extraction.

use super::analyser::{AnalyserSettings, FrequencyAnalyser};
use super::features::{reduce, AudioFeature, FeatureBands};
use super::input::AudioInput;

/// Turns an [`AudioInput`] into per-frame [`AudioFeature`] snapshots.
///
/// Polling drains whatever the input has buffered and never waits for more.
/// While inactive every poll returns the silent feature.
pub struct AudioFeatureExtractor {
    input: Box<dyn AudioInput>,
    analyser: FrequencyAnalyser,
    bands: FeatureBands,
    pending: Vec<f32>,
    sample_rate: u32,
    active: bool,
}

impl AudioFeatureExtractor {
    pub fn new(input: Box<dyn AudioInput>, settings: AnalyserSettings, bands: FeatureBands) -> Self {
        Self {
            input,
            analyser: FrequencyAnalyser::new(settings),
            bands,
            pending: Vec::with_capacity(settings.fft_size),
            sample_rate: 0,
            active: false,
        }
    }

    /// Extractor with the stock 2048-point analyser and band split.
    pub fn with_input(input: Box<dyn AudioInput>) -> Self {
        Self::new(input, AnalyserSettings::default(), FeatureBands::default())
    }

    /// Acquire the input. Returns `false` if it could not be opened.
    pub fn start(&mut self) -> bool {
        if self.active {
            return true;
        }
        match self.input.open() {
            Ok(sample_rate) => {
                self.sample_rate = sample_rate;
                self.analyser.reset();
                self.active = true;
                log::info!("Audio analysis started at {} Hz", sample_rate);
                true
            }
            Err(e) => {
                log::warn!("Audio input unavailable: {}", e);
                false
            }
        }
    }

    /// Release the input. Idempotent.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.input.close();
        self.active = false;
        self.analyser.reset();
        log::info!("Audio analysis stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Snapshot of the most recent sample window.
    pub fn get_frequency_data(&mut self) -> AudioFeature {
        if !self.active {
            return AudioFeature::silent(self.bands.spectrum_samples);
        }

        self.pending.clear();
        self.input.read_available(&mut self.pending);
        self.analyser.push_samples(&self.pending);

        let bins = self.analyser.refresh();
        reduce(bins, self.bands)
    }

    /// Frequency in Hz of the loudest bin at the last poll, 0 when inactive.
    pub fn dominant_frequency(&self) -> f32 {
        if !self.active {
            return 0.0;
        }
        self.analyser
            .peak_bin()
            .map_or(0.0, |bin| self.analyser.bin_to_freq(bin, self.sample_rate))
    }

    /// Sample rate of the open input, 0 before the first successful start.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bands(&self) -> FeatureBands {
        self.bands
    }
}

impl Drop for AudioFeatureExtractor {
    fn drop(&mut self) {
        self.stop();
    }
}
