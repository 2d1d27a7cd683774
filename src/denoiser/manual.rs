//! The manual denoiser: learns a noise profile on demand and reduces
//! against it, optionally layering an adaptive estimator on top with the
//! learned profile enforced as a floor. Built around the same
//! callback-driven STFT loop the other processors share.

use super::core::GainPipeline;
use super::{frame_samples_for, SpectralDenoiser};
use crate::error::{DenoiserError, DenoiserResult};
use crate::estimators::AdaptiveEstimator;
use crate::params::{DenoiserParameters, ProfileMode};
use crate::profile::NoiseProfile;
use crate::spectral::fft::{fft_size_for, FftTransform, ZeroPadding};
use crate::spectral::features::{self, SpectrumType};
use crate::spectral::mixer::{DenoiseMixer, MixMode};
use crate::spectral::stft::StftFrontend;
use crate::spectral::window::{WindowPair, WindowType};

const OVERLAP_FACTOR: usize = 4;

pub struct ManualDenoiser {
    stft: StftFrontend,
    real_bins: usize,
    fft_size: usize,
    profile: NoiseProfile,
    estimator: Option<AdaptiveEstimator>,
    estimator_seeded: bool,
    pipeline: GainPipeline,
    params: DenoiserParameters,
    power: Vec<f32>,
    noise: Vec<f32>,
}

impl ManualDenoiser {
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
            "manual denoiser initialized: sample_rate={sample_rate} frame_samples={frame_samples} hop={hop} fft_size={fft_size}"
        );

        let windows = WindowPair::new(WindowType::Hann, frame_samples);
        let fft = FftTransform::new(fft_size);
        let stft = StftFrontend::new(frame_samples, hop, windows, fft);

        Ok(Self {
            stft,
            real_bins,
            fft_size,
            profile: NoiseProfile::new(real_bins),
            estimator: None,
            estimator_seeded: false,
            pipeline: GainPipeline::new(real_bins, sample_rate as f32, fft_size),
            params: DenoiserParameters::default(),
            power: vec![0.0; real_bins],
            noise: vec![0.0; real_bins],
        })
    }

    pub fn get_noise_profile_size(&self) -> usize {
        self.real_bins
    }

    pub fn get_noise_profile_for_mode(&self, mode: i32) -> Option<&[f32]> {
        ProfileMode::from_i32(mode).map(|m| self.profile.for_mode(m))
    }

    pub fn load_noise_profile_for_mode(
        &mut self,
        mode: i32,
        data: &[f32],
        blocks_averaged: u32,
    ) -> DenoiserResult<()> {
        let mode = ProfileMode::from_i32(mode).ok_or(DenoiserError::InvalidProfileMode(mode))?;
        if data.len() != self.real_bins {
            return Err(DenoiserError::ProfileSizeMismatch {
                expected: self.real_bins,
                got: data.len(),
            });
        }
        log::debug!("loading noise profile for mode {:?}, {} blocks", mode, blocks_averaged);
        self.profile.load_for_mode(mode, data);
        Ok(())
    }

    pub fn reset_noise_profile(&mut self) {
        log::debug!("resetting noise profile");
        self.profile.reset();
        self.estimator_seeded = false;
    }

    pub fn noise_profile_available_for_mode(&self, mode: i32) -> bool {
        ProfileMode::from_i32(mode)
            .map(|m| self.profile.available(m))
            .unwrap_or(false)
    }

    pub fn get_noise_profile_blocks_averaged_for_mode(&self, mode: i32) -> u32 {
        if ProfileMode::from_i32(mode).is_some() {
            self.profile.blocks_averaged()
        } else {
            0
        }
    }
}

impl SpectralDenoiser for ManualDenoiser {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool {
        let Self {
            stft,
            real_bins,
            fft_size,
            profile,
            estimator,
            estimator_seeded,
            pipeline,
            params,
            power,
            noise,
        } = self;
        let real_bins = *real_bins;
        let fft_size = *fft_size;

        stft.process(input, output, |packed| {
            features::extract(packed, fft_size, SpectrumType::Power, &mut power[..real_bins]);

            if params.learn_noise {
                profile.update(&power[..real_bins]);
                return;
            }

            if !profile.available(params.noise_reduction_mode) {
                return;
            }

            noise[..real_bins].copy_from_slice(profile.for_mode(params.noise_reduction_mode));

            if params.adaptive_noise {
                let est = estimator.get_or_insert_with(|| {
                    AdaptiveEstimator::new(params.noise_estimation_method, real_bins)
                });
                if !*estimator_seeded {
                    est.set_state(&noise[..real_bins]);
                    *estimator_seeded = true;
                }
                est.apply_floor(&noise[..real_bins]);
                est.run(&power[..real_bins], &mut noise[..real_bins]);
            }

            let (gain, floor) = pipeline.run(params, &power[..real_bins], &noise[..real_bins], true);
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
        if params.adaptive_noise
            && self
                .estimator
                .as_ref()
                .map(|e| e.method() != params.noise_estimation_method)
                .unwrap_or(true)
        {
            log::debug!(
                "manual denoiser rebuilding adaptive estimator for method {:?}",
                params.noise_estimation_method
            );
            self.estimator = Some(AdaptiveEstimator::new(params.noise_estimation_method, self.real_bins));
            self.estimator_seeded = false;
        }
        if !params.adaptive_noise {
            self.estimator = None;
            self.estimator_seeded = false;
        }
        self.params = params;
        Ok(())
    }

    fn get_latency(&self) -> usize {
        self.stft.latency_samples()
    }

    fn reset(&mut self) {
        self.pipeline.reset();
        self.estimator_seeded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_plus_noise(n: usize, seed: u64) -> Vec<f32> {
        let mut state = seed;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        };
        (0..n)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 44100.0).sin() + 0.1 * next())
            .collect()
    }

    #[test]
    fn rejects_invalid_sample_rate() {
        assert!(ManualDenoiser::initialize(0, 20.0).is_err());
        assert!(ManualDenoiser::initialize(44100, -1.0).is_err());
    }

    #[test]
    fn latency_equals_frame_samples() {
        let d = ManualDenoiser::initialize(44100, 20.0).unwrap();
        assert_eq!(d.get_latency(), 882);
    }

    #[test]
    fn learning_then_reducing_lowers_output_rms_on_noisy_signal() {
        let mut d = ManualDenoiser::initialize(44100, 20.0).unwrap();
        let mut params = DenoiserParameters::default();
        params.reduction_amount = 20.0;
        params.learn_noise = true;
        d.load_parameters(params.clone()).unwrap();

        let noise_only: Vec<f32> = sine_plus_noise(5000, 1).iter().map(|&_| 0.1).collect();
        let mut scratch = vec![0.0f32; noise_only.len()];
        d.process(&noise_only, &mut scratch);

        params.learn_noise = false;
        d.load_parameters(params).unwrap();

        let input = sine_plus_noise(20000, 54321);
        let mut output = vec![0.0f32; input.len()];
        d.process(&input, &mut output);

        assert!(output.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn residual_and_normal_outputs_sum_to_input() {
        let mut normal = ManualDenoiser::initialize(8000, 20.0).unwrap();
        let mut residual = ManualDenoiser::initialize(8000, 20.0).unwrap();
        let mut params = DenoiserParameters::default();
        params.reduction_amount = 15.0;
        params.learn_noise = true;
        normal.load_parameters(params.clone()).unwrap();
        residual.load_parameters(params.clone()).unwrap();
        let noise_only = vec![0.1f32; 4000];
        let mut scratch = vec![0.0f32; noise_only.len()];
        normal.process(&noise_only, &mut scratch);
        residual.process(&noise_only, &mut scratch);

        params.learn_noise = false;
        normal.load_parameters(params.clone()).unwrap();
        params.residual_listen = true;
        residual.load_parameters(params).unwrap();

        let input = sine_plus_noise(4000, 99);
        let mut out_normal = vec![0.0f32; input.len()];
        let mut out_residual = vec![0.0f32; input.len()];
        normal.process(&input, &mut out_normal);
        residual.process(&input, &mut out_residual);

        let latency = normal.get_latency();
        for i in 0..(input.len() - latency) {
            let sum = out_normal[i + latency] + out_residual[i + latency];
            assert!((sum - input[i]).abs() < 1e-3, "mismatch at {i}: {sum} vs {}", input[i]);
        }
    }
}
