//! The adaptive denoiser: runs one of the three adaptive noise estimators
//! continuously (no manual profile, no learning phase) and reduces against
//! its live estimate every frame, never touching the manual profile.

use super::core::GainPipeline;
use super::{frame_samples_for, SpectralDenoiser};
use crate::error::{DenoiserError, DenoiserResult};
use crate::estimators::AdaptiveEstimator;
use crate::params::DenoiserParameters;
use crate::spectral::fft::{fft_size_for, FftTransform, ZeroPadding};
use crate::spectral::features::{self, SpectrumType};
use crate::spectral::mixer::{DenoiseMixer, MixMode};
use crate::spectral::stft::StftFrontend;
use crate::spectral::window::{WindowPair, WindowType};

const OVERLAP_FACTOR: usize = 2;

pub struct AdaptiveDenoiser {
    stft: StftFrontend,
    real_bins: usize,
    fft_size: usize,
    estimator: AdaptiveEstimator,
    pipeline: GainPipeline,
    params: DenoiserParameters,
    power: Vec<f32>,
    noise: Vec<f32>,
}

impl AdaptiveDenoiser {
    pub fn initialize(sample_rate: u32, frame_ms: f32) -> DenoiserResult<Self> {
        if sample_rate == 0 || sample_rate > 192_000 {
            return Err(DenoiserError::InvalidSampleRate(sample_rate));
        }
        if frame_ms <= 0.0 {
            return Err(DenoiserError::InvalidFrameSize(frame_ms));
        }

        let frame_samples = frame_samples_for(sample_rate, frame_ms);
        let hop = (frame_samples / OVERLAP_FACTOR).max(1);
        let fft_size = fft_size_for(frame_samples, ZeroPadding::None);
        let real_bins = fft_size / 2 + 1;

        log::info!(
            "adaptive denoiser initialized: sample_rate={sample_rate} frame_samples={frame_samples} hop={hop} fft_size={fft_size}"
        );

        let windows = WindowPair::new(WindowType::Vorbis, frame_samples);
        let fft = FftTransform::new(fft_size);
        let stft = StftFrontend::new(frame_samples, hop, windows, fft);
        let params = DenoiserParameters::default();

        Ok(Self {
            stft,
            real_bins,
            fft_size,
            estimator: AdaptiveEstimator::new(params.noise_estimation_method, real_bins),
            pipeline: GainPipeline::new(real_bins, sample_rate as f32, fft_size),
            params,
            power: vec![0.0; real_bins],
            noise: vec![0.0; real_bins],
        })
    }
}

impl SpectralDenoiser for AdaptiveDenoiser {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool {
        let Self {
            stft,
            real_bins,
            fft_size,
            estimator,
            pipeline,
            params,
            power,
            noise,
        } = self;
        let real_bins = *real_bins;
        let fft_size = *fft_size;

        stft.process(input, output, |packed| {
            features::extract(packed, fft_size, SpectrumType::Power, &mut power[..real_bins]);
            estimator.run(&power[..real_bins], &mut noise[..real_bins]);

            let (gain, floor) = pipeline.run(params, &power[..real_bins], &noise[..real_bins], false);
            let mode = if params.residual_listen {
                MixMode::ResidualListen
            } else {
                MixMode::Normal
            };
            DenoiseMixer::apply(packed, gain, floor, mode, fft_size);
        })
    }

    fn load_parameters(&mut self, params: DenoiserParameters) -> DenoiserResult<()> {
        let params = params.clamped();
        if self.estimator.method() != params.noise_estimation_method {
            log::debug!(
                "adaptive denoiser rebuilding estimator for method {:?}",
                params.noise_estimation_method
            );
            self.estimator = AdaptiveEstimator::new(params.noise_estimation_method, self.real_bins);
        }
        self.params = params;
        Ok(())
    }

    fn get_latency(&self) -> usize {
        self.stft.latency_samples()
    }

    fn reset(&mut self) {
        self.pipeline.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::EstimationMethod;

    fn sine_plus_noise(n: usize, seed: u64) -> Vec<f32> {
        let mut state = seed;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        };
        (0..n)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 44100.0).sin() + 0.2 * next())
            .collect()
    }

    #[test]
    fn estimator_choice_affects_output() {
        let input = sine_plus_noise(20000, 777);

        let mut a = AdaptiveDenoiser::initialize(44100, 20.0).unwrap();
        let mut params = DenoiserParameters::default();
        params.reduction_amount = 20.0;
        params.noise_estimation_method = EstimationMethod::SppMmse;
        a.load_parameters(params.clone()).unwrap();
        let mut out_a = vec![0.0f32; input.len()];
        a.process(&input, &mut out_a);

        let mut b = AdaptiveDenoiser::initialize(44100, 20.0).unwrap();
        params.noise_estimation_method = EstimationMethod::MinimumStatistics;
        b.load_parameters(params).unwrap();
        let mut out_b = vec![0.0f32; input.len()];
        b.process(&input, &mut out_b);

        let mut max_diff = 0.0f32;
        for i in 5000..input.len() {
            max_diff = max_diff.max((out_a[i] - out_b[i]).abs());
        }
        assert!(max_diff > 1e-4, "expected estimators to diverge, max diff {max_diff}");
    }

    #[test]
    fn output_stays_finite_for_all_methods() {
        let input = sine_plus_noise(44100, 42);
        for method in [
            EstimationMethod::SppMmse,
            EstimationMethod::TrimmedMean,
            EstimationMethod::MinimumStatistics,
        ] {
            let mut d = AdaptiveDenoiser::initialize(44100, 20.0).unwrap();
            let mut params = DenoiserParameters::default();
            params.noise_estimation_method = method;
            d.load_parameters(params).unwrap();
            let mut out = vec![0.0f32; input.len()];
            d.process(&input, &mut out);
            assert!(out.iter().all(|v| v.is_finite()));
        }
    }
}
