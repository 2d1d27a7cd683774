//! Noise floor manager: derives a per-bin spectral whitening weight from the
//! noise power spectrum's shape and mixes it into a floor the gain curve is
//! never allowed to drop below, so residual noise is shaped toward white
//! rather than left with its original colored character.
//!
//! Grounded on
//! `original_source/src/shared/post_estimation/spectral_whitening.c`'s
//! tapering window (right half of a Hamming window over the real-spectrum
//! size) and `original_source/src/shared/post_estimation/
//! noise_floor_manager.c`'s floor-mixing call site.

use std::f32::consts::PI;

pub struct NoiseFloorManager {
    taper: Vec<f32>,
    weights: Vec<f32>,
}

impl NoiseFloorManager {
    pub fn new(real_bins: usize) -> Self {
        // Right half of a Hamming window: tapers whitening strength toward
        // zero at Nyquist so the top of the band isn't over-brightened.
        let n = (real_bins * 2).max(2) as f32;
        let taper = (0..real_bins)
            .map(|k| {
                let x = real_bins as f32 + k as f32;
                0.54 - 0.46 * (2.0 * PI * x / (n - 1.0)).cos()
            })
            .collect();
        Self {
            taper,
            weights: vec![0.0; real_bins],
        }
    }

    /// Recomputes whitening weights from the current noise power estimate.
    /// `whitening_factor` in `[0, 1]` interpolates between no whitening (0)
    /// and full spectral flattening (1).
    fn update_weights(&mut self, noise_power: &[f32], whitening_factor: f32) {
        let max_noise = noise_power.iter().cloned().fold(0.0f32, f32::max).max(1e-20);
        for (k, &n) in noise_power.iter().enumerate() {
            let ratio = (max_noise / n.max(1e-20)).powf(whitening_factor);
            self.weights[k] = ratio * self.taper[k];
        }
    }

    /// Writes the mixed noise floor (clamped to `<= 1`) into `floor_out`,
    /// scaled by `reduction_amount` (the linear gain floor from maximum
    /// attenuation) and mirrored so the caller can apply it symmetrically
    /// across the full FFT length if needed.
    pub fn compute(
        &mut self,
        noise_power: &[f32],
        whitening_factor: f32,
        reduction_amount: f32,
        floor_out: &mut [f32],
    ) {
        debug_assert_eq!(noise_power.len(), self.weights.len());
        debug_assert_eq!(floor_out.len(), self.weights.len());
        self.update_weights(noise_power, whitening_factor);
        for k in 0..floor_out.len() {
            floor_out[k] = (reduction_amount * self.weights[k]).min(1.0);
        }
    }

    /// Mirrors a `real_bins`-length curve across the full `fft_size`,
    /// matching the packed-half-spectrum convention's implicit symmetry.
    pub fn mirror_full_length(real_bins_curve: &[f32], fft_size: usize, out: &mut [f32]) {
        debug_assert_eq!(out.len(), fft_size);
        let real_bins = real_bins_curve.len();
        for k in 0..real_bins {
            out[k] = real_bins_curve[k];
        }
        for k in real_bins..fft_size {
            out[k] = real_bins_curve[fft_size - k];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_noise_gives_uniform_weight_before_taper() {
        let real_bins = 17;
        let mut mgr = NoiseFloorManager::new(real_bins);
        let noise = vec![0.5f32; real_bins];
        let mut floor = vec![0.0f32; real_bins];
        mgr.compute(&noise, 0.0, 0.1, &mut floor);
        for &f in &floor {
            assert!((f - 0.1).abs() < 1e-4);
        }
    }

    #[test]
    fn floor_never_exceeds_one() {
        let real_bins = 9;
        let mut mgr = NoiseFloorManager::new(real_bins);
        let mut noise = vec![1.0f32; real_bins];
        noise[0] = 1e-9;
        let mut floor = vec![0.0f32; real_bins];
        mgr.compute(&noise, 1.0, 1.0, &mut floor);
        for &f in &floor {
            assert!(f <= 1.0);
        }
    }

    #[test]
    fn mirror_reproduces_conjugate_symmetric_layout() {
        let real_bins = 5;
        let fft_size = 8;
        let curve = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let mut out = vec![0.0f32; fft_size];
        NoiseFloorManager::mirror_full_length(&curve, fft_size, &mut out);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[4], 5.0);
        assert_eq!(out[5], curve[3]);
        assert_eq!(out[7], curve[1]);
    }
}
