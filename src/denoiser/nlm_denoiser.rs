//! The 2-D (NLM) denoiser: layers non-local-means smoothing over the SNR
//! surface before mixing, trading a few frames of extra look-ahead latency
//! for speckle-free residual noise. The delayed FFT/noise ring buffers
//! follow the same push/overwrite ring idiom as
//! [`crate::spectral::nlm::NlmSmoother`]'s internal history.

use super::core::GainPipeline;
use super::{frame_samples_for, SpectralDenoiser};
use crate::error::{DenoiserError, DenoiserResult};
use crate::estimators::AdaptiveEstimator;
use crate::params::{DenoiserParameters, ProfileMode};
use crate::profile::NoiseProfile;
use crate::spectral::fft::{fft_size_for, FftTransform, ZeroPadding};
use crate::spectral::features::{self, SpectrumType};
use crate::spectral::mixer::{DenoiseMixer, MixMode};
use crate::spectral::nlm::{NlmParams, NlmSmoother};
use crate::spectral::stft::StftFrontend;
use crate::spectral::window::{WindowPair, WindowType};

const OVERLAP_FACTOR: usize = 4;

/// A fixed-capacity ring that returns the slot it is about to overwrite
/// (the delayed value) on every push, falling back to silence until full.
struct DelayRing {
    slots: Vec<Vec<f32>>,
    write_pos: usize,
    filled: usize,
    capacity: usize,
}

impl DelayRing {
    fn new(capacity: usize, width: usize) -> Self {
        Self {
            slots: vec![vec![0.0; width]; capacity],
            write_pos: 0,
            filled: 0,
            capacity,
        }
    }

    fn push_and_delay(&mut self, new_value: &[f32], out: &mut [f32]) {
        out.copy_from_slice(&self.slots[self.write_pos]);
        self.slots[self.write_pos].copy_from_slice(new_value);
        self.write_pos = (self.write_pos + 1) % self.capacity;
        self.filled = (self.filled + 1).min(self.capacity);
    }
}

pub struct NlmDenoiser {
    stft: StftFrontend,
    real_bins: usize,
    fft_size: usize,
    profile: NoiseProfile,
    estimator: Option<AdaptiveEstimator>,
    estimator_seeded: bool,
    pipeline: GainPipeline,
    nlm: NlmSmoother,
    fft_ring: DelayRing,
    noise_ring: DelayRing,
    params: DenoiserParameters,
    power: Vec<f32>,
    noise: Vec<f32>,
    snr: Vec<f32>,
    smoothed_snr: Vec<f32>,
    delayed_fft: Vec<f32>,
    delayed_noise: Vec<f32>,
    reconstructed_power: Vec<f32>,
}

impl NlmDenoiser {
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
            "2-D denoiser initialized: sample_rate={sample_rate} frame_samples={frame_samples} hop={hop} fft_size={fft_size}"
        );

        let windows = WindowPair::new(WindowType::Hann, frame_samples);
        let fft = FftTransform::new(fft_size);
        let stft = StftFrontend::new(frame_samples, hop, windows, fft);

        let nlm_params = NlmParams::default();
        let look_ahead = nlm_params.history_future;
        let ring_capacity = look_ahead + 1;

        Ok(Self {
            stft,
            real_bins,
            fft_size,
            profile: NoiseProfile::new(real_bins),
            estimator: None,
            estimator_seeded: false,
            pipeline: GainPipeline::new(real_bins, sample_rate as f32, fft_size),
            nlm: NlmSmoother::new(real_bins, nlm_params),
            fft_ring: DelayRing::new(ring_capacity, fft_size),
            noise_ring: DelayRing::new(ring_capacity, real_bins),
            params: DenoiserParameters::default(),
            power: vec![0.0; real_bins],
            noise: vec![0.0; real_bins],
            snr: vec![0.0; real_bins],
            smoothed_snr: vec![0.0; real_bins],
            delayed_fft: vec![0.0; fft_size],
            delayed_noise: vec![0.0; real_bins],
            reconstructed_power: vec![0.0; real_bins],
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
        _blocks_averaged: u32,
    ) -> DenoiserResult<()> {
        let mode = ProfileMode::from_i32(mode).ok_or(DenoiserError::InvalidProfileMode(mode))?;
        if data.len() != self.real_bins {
            return Err(DenoiserError::ProfileSizeMismatch {
                expected: self.real_bins,
                got: data.len(),
            });
        }
        self.profile.load_for_mode(mode, data);
        Ok(())
    }

    pub fn reset_noise_profile(&mut self) {
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

    /// Frames of extra look-ahead the NLM smoother imposes beyond the STFT's
    /// own one-frame latency.
    pub fn look_ahead_frames(&self) -> usize {
        self.nlm.look_ahead_frames()
    }
}

impl SpectralDenoiser for NlmDenoiser {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool {
        let Self {
            stft,
            real_bins,
            fft_size,
            profile,
            estimator,
            estimator_seeded,
            pipeline,
            nlm,
            fft_ring,
            noise_ring,
            params,
            power,
            noise,
            snr,
            smoothed_snr,
            delayed_fft,
            delayed_noise,
            reconstructed_power,
        } = self;
        let real_bins = *real_bins;
        let fft_size = *fft_size;

        stft.process(input, output, |packed| {
            features::extract(packed, fft_size, SpectrumType::Power, &mut power[..real_bins]);

            if params.learn_noise {
                profile.update(&power[..real_bins]);
                return;
            }

            let have_noise = profile.available(params.noise_reduction_mode);
            if have_noise {
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
            } else {
                noise[..real_bins].fill(1e-6);
            }

            for k in 0..real_bins {
                snr[k] = power[k] / noise[k].max(1e-20);
            }

            fft_ring.push_and_delay(packed, &mut delayed_fft[..fft_size]);
            noise_ring.push_and_delay(&noise[..real_bins], &mut delayed_noise[..real_bins]);

            let ready = nlm.push_and_smooth(&snr[..real_bins], &mut smoothed_snr[..real_bins]);

            if ready && have_noise {
                for k in 0..real_bins {
                    reconstructed_power[k] = smoothed_snr[k] * delayed_noise[k];
                }
                let (gain, floor) = pipeline.run(
                    params,
                    &reconstructed_power[..real_bins],
                    &delayed_noise[..real_bins],
                    false,
                );
                let mode = if params.residual_listen {
                    MixMode::ResidualListen
                } else {
                    MixMode::Normal
                };
                packed.copy_from_slice(&delayed_fft[..fft_size]);
                DenoiseMixer::apply(packed, gain, floor, mode, fft_size);
            } else {
                packed.copy_from_slice(&delayed_fft[..fft_size]);
            }
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
        self.stft.latency_samples() + self.nlm.look_ahead_frames() * self.stft.hop_samples()
    }

    fn reset(&mut self) {
        self.pipeline.reset();
        self.estimator_seeded = false;
    }
}
