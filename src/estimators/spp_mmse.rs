//! Speech-presence-probability MMSE noise power estimator: a fixed a
//! priori SNR soft-decision estimator that blends the previous noise
//! estimate with the current observation, weighted by the probability
//! that the frame is noise-only.
//!
//! Grounded on `original_source/src/shared/noise_estimation/spp_mmse_noise_estimator.c`.

const SILENCE_THRESHOLD: f32 = 1e-8;
const FIXED_XI_H1: f32 = 31.62; // 15 dB in linear
const ALPHA_POW: f32 = 0.8;
const SMOOTH_SPP: f32 = 0.9;
const CURRENT_SPP: f32 = 0.1;
const STAGNATION_CAP: f32 = 0.99;

fn compute_spp_probability(observation_power: f32, previous_noise_psd: f32) -> f32 {
    let previous_noise_psd = previous_noise_psd.max(1e-12);
    let ratio = observation_power / previous_noise_psd;
    let exponent = -ratio * (FIXED_XI_H1 / (1.0 + FIXED_XI_H1));
    let exp_term = exponent.exp();
    let exp_term = if exp_term.is_finite() {
        exp_term
    } else if exponent > 0.0 {
        f32::MAX
    } else {
        0.0
    };
    let denominator_ratio = (1.0 + FIXED_XI_H1) * exp_term;
    (1.0 / (1.0 + denominator_ratio)).clamp(0.0, 1.0)
}

pub struct SppMmse {
    size: usize,
    previous_noise_psd: Vec<f32>,
    smoothed_spp: Vec<f32>,
    is_first_frame: bool,
}

impl SppMmse {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            previous_noise_psd: vec![0.0; size],
            smoothed_spp: vec![0.0; size],
            is_first_frame: true,
        }
    }

    pub fn run(&mut self, spectrum: &[f32], noise_spectrum: &mut [f32]) -> bool {
        if spectrum.len() != self.size || noise_spectrum.len() != self.size {
            return false;
        }
        let frame_energy = spectrum.iter().sum::<f32>() / self.size as f32;

        if self.is_first_frame {
            if frame_energy < SILENCE_THRESHOLD {
                noise_spectrum.fill(0.0);
                return true;
            }
            self.previous_noise_psd.copy_from_slice(spectrum);
            self.smoothed_spp.fill(0.0);
            noise_spectrum.copy_from_slice(spectrum);
            self.is_first_frame = false;
            return true;
        }

        if frame_energy < SILENCE_THRESHOLD {
            noise_spectrum.copy_from_slice(&self.previous_noise_psd);
            return true;
        }

        for k in 0..self.size {
            let mut spp_h1 = compute_spp_probability(spectrum[k], self.previous_noise_psd[k]);
            if self.smoothed_spp[k] > STAGNATION_CAP {
                spp_h1 = spp_h1.min(STAGNATION_CAP);
            }
            let spp_h0 = 1.0 - spp_h1;

            let mmse_estimate =
                spp_h0 * spectrum[k] + spp_h1 * self.previous_noise_psd[k];

            noise_spectrum[k] =
                ALPHA_POW * self.previous_noise_psd[k] + (1.0 - ALPHA_POW) * mmse_estimate;

            self.smoothed_spp[k] = SMOOTH_SPP * self.smoothed_spp[k] + CURRENT_SPP * spp_h1;
            self.previous_noise_psd[k] = noise_spectrum[k];
        }
        true
    }

    pub fn set_state(&mut self, initial_profile: &[f32]) {
        for k in 0..self.size {
            self.previous_noise_psd[k] = initial_profile[k].max(f32::MIN_POSITIVE);
            self.smoothed_spp[k] = 0.0;
        }
        self.is_first_frame = false;
    }

    pub fn update_seed(&mut self, seed_profile: &[f32]) {
        for k in 0..self.size {
            self.previous_noise_psd[k] = seed_profile[k].max(f32::MIN_POSITIVE);
            self.smoothed_spp[k] = 0.0;
        }
    }

    pub fn apply_floor(&mut self, floor_profile: &[f32]) {
        for k in 0..self.size {
            if self.previous_noise_psd[k] < floor_profile[k] {
                self.previous_noise_psd[k] = floor_profile[k];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_passes_through_as_estimate() {
        let mut est = SppMmse::new(3);
        let spectrum = vec![0.3, 0.4, 0.5];
        let mut out = vec![0.0; 3];
        est.run(&spectrum, &mut out);
        assert_eq!(out, spectrum);
    }

    #[test]
    fn loud_transient_does_not_immediately_inflate_noise_estimate() {
        let mut est = SppMmse::new(2);
        let quiet = vec![0.01f32, 0.01];
        let mut out = vec![0.0; 2];
        for _ in 0..20 {
            est.run(&quiet, &mut out);
        }
        let loud = vec![5.0f32, 5.0];
        est.run(&loud, &mut out);
        assert!(out[0] < 1.0, "a single loud frame should barely move the estimate, got {}", out[0]);
    }
}
