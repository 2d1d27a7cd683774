//! The gain-shaping pipeline shared by all three top-level processors:
//! noise-scaling criteria -> spectral smoother -> gain rule -> noise floor
//! and whitening -> optional post-filter. Orchestration of *which* noise
//! estimate feeds this pipeline (manual profile, adaptive estimator, or
//! both) lives in the three processor modules; this struct only owns the
//! perceptual/gain math itself.

use crate::params::DenoiserParameters;
use crate::spectral::critical_bands::{BandType, CriticalBands};
use crate::spectral::gain::{self, GainRule};
use crate::spectral::masking::MaskingEstimator;
use crate::spectral::noise_floor::NoiseFloorManager;
use crate::spectral::noise_scaling::NoiseScalingCriteria;
use crate::spectral::postfilter::PostFilter;
use crate::spectral::smoother::SpectralSmoother;

pub struct GainPipeline {
    real_bins: usize,
    scaling: NoiseScalingCriteria,
    smoother: SpectralSmoother,
    postfilter: PostFilter,
    noise_floor: NoiseFloorManager,
    alpha: Vec<f32>,
    beta: Vec<f32>,
    gain: Vec<f32>,
    floor: Vec<f32>,
}

impl GainPipeline {
    pub fn new(real_bins: usize, sample_rate: f32, fft_size: usize) -> Self {
        let bands = CriticalBands::new(BandType::Opus, sample_rate, fft_size);
        let mask_bands = CriticalBands::new(BandType::Opus, sample_rate, fft_size);
        let masking = MaskingEstimator::new(mask_bands, sample_rate, real_bins);
        Self {
            real_bins,
            scaling: NoiseScalingCriteria::new(bands, masking, real_bins),
            smoother: SpectralSmoother::new(real_bins),
            postfilter: PostFilter::new(real_bins),
            noise_floor: NoiseFloorManager::new(real_bins),
            alpha: vec![0.0; real_bins],
            beta: vec![0.0; real_bins],
            gain: vec![0.0; real_bins],
            floor: vec![0.0; real_bins],
        }
    }

    pub fn reset(&mut self) {
        self.smoother.reset();
    }

    fn a_posteriori_snr(&self, reference: &[f32], gain: &[f32]) -> f32 {
        let mut num = 0.0f32;
        let mut den = 0.0f32;
        for k in 0..self.real_bins {
            let filtered = reference[k] * gain[k];
            num += filtered * filtered;
            den += reference[k] * reference[k];
        }
        10.0 * (num.max(1e-20) / den.max(1e-20)).log10()
    }

    /// Runs the full scaling -> smoothing -> gain -> floor/whitening ->
    /// post-filter pipeline. `with_transient_protection` selects the
    /// manual denoiser's transient-aware smoother versus the plain IIR
    /// used by the adaptive and 2-D processors. Returns `(gain, floor)`,
    /// both length `real_bins`.
    pub fn run(
        &mut self,
        params: &DenoiserParameters,
        reference: &[f32],
        noise: &[f32],
        with_transient_protection: bool,
    ) -> (&[f32], &[f32]) {
        self.scaling.compute(
            params.noise_scaling_type,
            reference,
            noise,
            params.noise_rescale,
            &mut self.alpha,
            &mut self.beta,
        );
        gain::compute(
            GainRule::Wiener,
            reference,
            noise,
            &self.alpha,
            &self.beta,
            &mut self.gain,
        );

        let alpha_smooth = params.smoothing_alpha();
        if with_transient_protection {
            self.smoother.smooth(&mut self.gain, reference, alpha_smooth);
        } else {
            self.smoother.smooth_plain(&mut self.gain, alpha_smooth);
        }

        self.noise_floor.compute(
            noise,
            params.whitening_amount(),
            params.gain_floor(),
            &mut self.floor,
        );

        let zeta_db = self.a_posteriori_snr(reference, &self.gain);
        self.postfilter
            .apply(&mut self.gain, zeta_db, params.post_filter_threshold, true);

        let gain_floor = params.gain_floor();
        for k in 0..self.real_bins {
            self.gain[k] = self.floor[k] + (1.0 - self.floor[k]) * self.gain[k];
            self.gain[k] = self.gain[k].clamp(gain_floor, 1.0);
        }

        (&self.gain, &self.floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DenoiserParameters;

    #[test]
    fn gain_stays_in_unit_range_after_full_pipeline() {
        let real_bins = 129;
        let mut pipeline = GainPipeline::new(real_bins, 44100.0, 256);
        let params = DenoiserParameters::default();
        let reference: Vec<f32> = (0..real_bins).map(|k| 1.0 + (k as f32 * 0.1).sin()).collect();
        let noise = vec![0.2f32; real_bins];
        let (gain, _floor) = pipeline.run(&params, &reference, &noise, true);
        for &g in gain {
            assert!((0.0..=1.0).contains(&g));
        }
    }

    #[test]
    fn strong_noise_relative_to_signal_drives_gain_down() {
        let real_bins = 65;
        let mut pipeline = GainPipeline::new(real_bins, 44100.0, 128);
        let mut params = DenoiserParameters::default();
        params.reduction_amount = 40.0;
        params.noise_scaling_type = crate::params::NoiseScalingType::GlobalSnr;
        let reference = vec![0.1f32; real_bins];
        let noise = vec![1.0f32; real_bins];
        let (gain, _floor) = pipeline.run(&params, &reference, &noise, true);
        let avg: f32 = gain.iter().sum::<f32>() / real_bins as f32;
        assert!(avg < 0.9, "expected attenuation for noisy bins, got avg gain {avg}");
    }
}
