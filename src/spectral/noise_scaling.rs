//! Noise-scaling criteria: maps a (signal, noise) pair to an
//! oversubtraction/undersubtraction factor pair `(alpha, beta)` consumed by
//! the gain rule. Four strategies, selected by [`crate::params::NoiseScalingType`].
//!
//! Grounded on `original_source/src/shared/pre_estimation/noise_scaling_criterias.c`:
//! the global- and per-band-SNR branches both linearly interpolate alpha
//! between a low-SNR ceiling and a high-SNR floor across a fixed 0..20dB
//! window; the masking branch instead keys off the noise-to-mask ratio.

use super::critical_bands::CriticalBands;
use super::masking::{MaskingEstimator, ELASTIC_PROTECTION_FACTOR};
use crate::params::NoiseScalingType;

const SNR_LOW_DB: f32 = 0.0;
const SNR_HIGH_DB: f32 = 20.0;
const ALPHA_AT_LOW_SNR: f32 = 6.0;
const ALPHA_AT_HIGH_SNR: f32 = 1.0;
const BETA_MIN: f32 = 0.01;

fn lerp_alpha(snr_db: f32) -> f32 {
    let t = ((snr_db - SNR_LOW_DB) / (SNR_HIGH_DB - SNR_LOW_DB)).clamp(0.0, 1.0);
    ALPHA_AT_LOW_SNR + t * (ALPHA_AT_HIGH_SNR - ALPHA_AT_LOW_SNR)
}

fn snr_db(signal: f32, noise: f32) -> f32 {
    10.0 * (signal.max(1e-20) / noise.max(1e-20)).log10()
}

pub struct NoiseScalingCriteria {
    bands: CriticalBands,
    masking: MaskingEstimator,
    real_bins: usize,
    threshold_scratch: Vec<f32>,
    nmr_scratch: Vec<f32>,
}

impl NoiseScalingCriteria {
    pub fn new(bands: CriticalBands, masking: MaskingEstimator, real_bins: usize) -> Self {
        Self {
            bands,
            masking,
            real_bins,
            threshold_scratch: vec![0.0; real_bins],
            nmr_scratch: vec![0.0; real_bins],
        }
    }

    /// Writes `(alpha, beta)` per bin into `alpha_out`/`beta_out`, both of
    /// length `real_bins`, given the reference signal and noise power
    /// spectra and the extra oversubtraction offset `noise_rescale_db`.
    pub fn compute(
        &mut self,
        scaling_type: NoiseScalingType,
        signal_power: &[f32],
        noise_power: &[f32],
        noise_rescale_db: f32,
        alpha_out: &mut [f32],
        beta_out: &mut [f32],
    ) {
        debug_assert_eq!(signal_power.len(), self.real_bins);
        debug_assert_eq!(noise_power.len(), self.real_bins);
        debug_assert_eq!(alpha_out.len(), self.real_bins);
        debug_assert_eq!(beta_out.len(), self.real_bins);

        match scaling_type {
            NoiseScalingType::Disabled => {
                alpha_out.fill(1.0);
                beta_out.fill(BETA_MIN);
            }
            NoiseScalingType::GlobalSnr => {
                let sig_total: f32 = signal_power.iter().sum();
                let noise_total: f32 = noise_power.iter().sum();
                let alpha = lerp_alpha(snr_db(sig_total, noise_total)) + noise_rescale_db / 10.0;
                alpha_out.fill(alpha);
                beta_out.fill(BETA_MIN);
            }
            NoiseScalingType::PerBandSnr => {
                for range in &self.bands.bands {
                    let sig: f32 = signal_power[range.start_bin..range.end_bin].iter().sum();
                    let noi: f32 = noise_power[range.start_bin..range.end_bin].iter().sum();
                    let alpha = lerp_alpha(snr_db(sig, noi)) + noise_rescale_db / 10.0;
                    for k in range.start_bin..range.end_bin {
                        alpha_out[k] = alpha;
                        beta_out[k] = BETA_MIN;
                    }
                }
            }
            NoiseScalingType::MaskingThresholds => {
                self.masking.estimate(signal_power, &mut self.threshold_scratch);
                self.masking.noise_to_mask_ratio(noise_power, &self.threshold_scratch, &mut self.nmr_scratch);
                for k in 0..self.real_bins {
                    // Above the mask, fall back to the global oversubtraction
                    // ceiling; below it, relax toward 1 but keep the elastic
                    // protection margin so masked noise is never left fully
                    // unscaled.
                    let t = (self.nmr_scratch[k] / 10.0).clamp(0.0, 1.0);
                    let alpha = ALPHA_AT_HIGH_SNR
                        + t * (ALPHA_AT_LOW_SNR - ALPHA_AT_HIGH_SNR)
                        + noise_rescale_db / 10.0;
                    alpha_out[k] = alpha;
                    beta_out[k] = BETA_MIN + (1.0 - t) * ELASTIC_PROTECTION_FACTOR * BETA_MIN;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::critical_bands::BandType;

    fn criteria(fft_size: usize) -> (NoiseScalingCriteria, usize) {
        let real_bins = fft_size / 2 + 1;
        let bands = CriticalBands::new(BandType::Opus, 44100.0, fft_size);
        let bands_for_mask = CriticalBands::new(BandType::Opus, 44100.0, fft_size);
        let masking = MaskingEstimator::new(bands_for_mask, 44100.0, real_bins);
        (NoiseScalingCriteria::new(bands, masking, real_bins), real_bins)
    }

    #[test]
    fn disabled_gives_unit_alpha() {
        let (mut c, real_bins) = criteria(256);
        let signal = vec![1.0f32; real_bins];
        let noise = vec![0.1f32; real_bins];
        let mut alpha = vec![0.0f32; real_bins];
        let mut beta = vec![0.0f32; real_bins];
        c.compute(NoiseScalingType::Disabled, &signal, &noise, 0.0, &mut alpha, &mut beta);
        assert!(alpha.iter().all(|&a| (a - 1.0).abs() < 1e-6));
    }

    #[test]
    fn global_snr_alpha_rises_as_snr_drops() {
        let (mut c, real_bins) = criteria(256);
        let signal = vec![1.0f32; real_bins];
        let mut alpha_loud = vec![0.0f32; real_bins];
        let mut beta = vec![0.0f32; real_bins];
        let loud_noise = vec![0.9f32; real_bins];
        let quiet_noise = vec![0.001f32; real_bins];
        c.compute(NoiseScalingType::GlobalSnr, &signal, &loud_noise, 0.0, &mut alpha_loud, &mut beta);
        let mut alpha_quiet = vec![0.0f32; real_bins];
        c.compute(NoiseScalingType::GlobalSnr, &signal, &quiet_noise, 0.0, &mut alpha_quiet, &mut beta);
        assert!(alpha_loud[0] > alpha_quiet[0]);
    }

    #[test]
    fn per_band_snr_is_constant_within_a_band() {
        let (mut c, real_bins) = criteria(256);
        let mut signal = vec![1.0f32; real_bins];
        signal[3] = 50.0;
        let noise = vec![0.5f32; real_bins];
        let mut alpha = vec![0.0f32; real_bins];
        let mut beta = vec![0.0f32; real_bins];
        c.compute(NoiseScalingType::PerBandSnr, &signal, &noise, 0.0, &mut alpha, &mut beta);
        let band = c.bands.band_of_bin(3);
        let range = c.bands.bands[band];
        let first = alpha[range.start_bin];
        for k in range.start_bin..range.end_bin {
            assert!((alpha[k] - first).abs() < 1e-5);
        }
    }
}
