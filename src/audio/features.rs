//! Reduction of magnitude bins to the normalized feature vector.

/// Normalized summary of the audio signal at one polling instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioFeature {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub volume: f32,
    /// Down-sampled spectrum, fixed length.
    pub spectrum: Vec<f32>,
}

impl AudioFeature {
    /// The all-zero feature with a spectrum of `spectrum_len` samples.
    pub fn silent(spectrum_len: usize) -> Self {
        Self {
            spectrum: vec![0.0; spectrum_len],
            ..Default::default()
        }
    }

    pub fn is_silent(&self) -> bool {
        self.volume == 0.0
            && self.bass == 0.0
            && self.mid == 0.0
            && self.treble == 0.0
            && self.spectrum.iter().all(|&s| s == 0.0)
    }
}

/// Bin boundaries of the three bands and the spectrum length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureBands {
    /// Bass covers `[0, bass_end)`.
    pub bass_end: usize,
    /// Mid covers `[bass_end, mid_end)`, treble `[mid_end, bins)`.
    pub mid_end: usize,
    pub spectrum_samples: usize,
}

impl Default for FeatureBands {
    fn default() -> Self {
        Self {
            bass_end: 100,
            mid_end: 500,
            spectrum_samples: 64,
        }
    }
}

/// Largest magnitude a bin can hold.
pub const MAX_MAGNITUDE: f32 = 255.0;

/// Reduce byte magnitude bins to an [`AudioFeature`].
///
/// Band ranges are clamped to the bin count; an empty range reduces to 0.
pub fn reduce(bins: &[u8], bands: FeatureBands) -> AudioFeature {
    let len = bins.len();
    let bass_end = bands.bass_end.min(len);
    let mid_end = bands.mid_end.clamp(bass_end, len);

    let spectrum = if len == 0 {
        vec![0.0; bands.spectrum_samples]
    } else {
        let stride = (len / bands.spectrum_samples.max(1)).max(1);
        (0..bands.spectrum_samples)
            .map(|i| {
                bins.get(i * stride)
                    .map_or(0.0, |&b| b as f32 / MAX_MAGNITUDE)
            })
            .collect()
    };

    AudioFeature {
        bass: band_average(&bins[..bass_end]),
        mid: band_average(&bins[bass_end..mid_end]),
        treble: band_average(&bins[mid_end..]),
        volume: band_average(bins),
        spectrum,
    }
}

fn band_average(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    (sum as f32 / bins.len() as f32 / MAX_MAGNITUDE).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_feature_has_declared_length() {
        let feature = AudioFeature::silent(64);
        assert_eq!(feature.spectrum.len(), 64);
        assert!(feature.is_silent());
    }

    #[test]
    fn test_bands_average_their_ranges() {
        let mut bins = vec![0u8; 1024];
        bins[..100].fill(255);
        bins[100..500].fill(51);

        let feature = reduce(&bins, FeatureBands::default());

        assert_eq!(feature.bass, 1.0);
        assert!((feature.mid - 0.2).abs() < 1e-6);
        assert_eq!(feature.treble, 0.0);
        let expected_volume = (100.0 * 255.0 + 400.0 * 51.0) / 1024.0 / 255.0;
        assert!((feature.volume - expected_volume).abs() < 1e-6);
    }

    #[test]
    fn test_spectrum_strides_across_bins() {
        let bins: Vec<u8> = (0..1024).map(|i| (i / 4) as u8).collect();
        let feature = reduce(&bins, FeatureBands::default());

        assert_eq!(feature.spectrum.len(), 64);
        // stride 16: sample i reads bin 16 * i
        assert_eq!(feature.spectrum[1], 4.0 / 255.0);
        assert_eq!(feature.spectrum[63], 252.0 / 255.0);
    }

    #[test]
    fn test_short_bin_buffers_clamp_ranges() {
        let bins = vec![255u8; 50];
        let feature = reduce(&bins, FeatureBands::default());

        assert_eq!(feature.bass, 1.0);
        assert_eq!(feature.mid, 0.0);
        assert_eq!(feature.treble, 0.0);
        assert_eq!(feature.spectrum.len(), 64);
        assert!(feature.spectrum.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_empty_bins_reduce_to_silence() {
        let feature = reduce(&[], FeatureBands::default());
        assert!(feature.is_silent());
        assert_eq!(feature.spectrum.len(), 64);
    }
}
