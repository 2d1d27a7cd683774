//! The parameter struct recognized by `load_parameters`, shared by all three
//! top-level processors. Field ranges match the option table in the external
//! interface contract; values outside range are clamped rather than rejected,
//! since `load_parameters` must stay real-time safe and side-effect-free on
//! bad input (aside from the one allowed reallocation below).

use serde::{Deserialize, Serialize};

/// Which of the three manual profile statistics is applied during reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ProfileMode {
    RollingMean = 1,
    Median = 2,
    Max = 3,
}

impl ProfileMode {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            1 => Some(Self::RollingMean),
            2 => Some(Self::Median),
            3 => Some(Self::Max),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as i32 as usize - 1
    }
}

/// Selects which adaptive noise-power estimator backs the adaptive layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum EstimationMethod {
    SppMmse = 0,
    TrimmedMean = 1,
    MinimumStatistics = 2,
}

impl EstimationMethod {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::SppMmse),
            1 => Some(Self::TrimmedMean),
            2 => Some(Self::MinimumStatistics),
            _ => None,
        }
    }
}

/// Selects how the oversubtraction/undersubtraction factors (alpha, beta)
/// are derived from the current (reference, noise) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum NoiseScalingType {
    GlobalSnr = 0,
    PerBandSnr = 1,
    MaskingThresholds = 2,
    Disabled = 3,
}

impl NoiseScalingType {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::GlobalSnr),
            1 => Some(Self::PerBandSnr),
            2 => Some(Self::MaskingThresholds),
            3 => Some(Self::Disabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenoiserParameters {
    pub residual_listen: bool,
    pub learn_noise: bool,
    pub noise_reduction_mode: ProfileMode,
    /// dB, 0..=40.
    pub reduction_amount: f32,
    /// Percent, 0..=100.
    pub smoothing_factor: f32,
    /// Percent, 0..=100.
    pub whitening_factor: f32,
    pub noise_scaling_type: NoiseScalingType,
    /// dB, 0..=12, added to the base oversubtraction alpha.
    pub noise_rescale: f32,
    /// dB, -10..=10, the post-filter's SNR threshold.
    pub post_filter_threshold: f32,
    pub noise_estimation_method: EstimationMethod,
    pub adaptive_noise: bool,
}

impl Default for DenoiserParameters {
    fn default() -> Self {
        Self {
            residual_listen: false,
            learn_noise: false,
            noise_reduction_mode: ProfileMode::RollingMean,
            reduction_amount: 10.0,
            smoothing_factor: 0.0,
            whitening_factor: 0.0,
            noise_scaling_type: NoiseScalingType::GlobalSnr,
            noise_rescale: 0.0,
            post_filter_threshold: 0.0,
            noise_estimation_method: EstimationMethod::MinimumStatistics,
            adaptive_noise: false,
        }
    }
}

impl DenoiserParameters {
    pub fn clamped(mut self) -> Self {
        self.reduction_amount = self.reduction_amount.clamp(0.0, 40.0);
        self.smoothing_factor = self.smoothing_factor.clamp(0.0, 100.0);
        self.whitening_factor = self.whitening_factor.clamp(0.0, 100.0);
        self.noise_rescale = self.noise_rescale.clamp(0.0, 12.0);
        self.post_filter_threshold = self.post_filter_threshold.clamp(-10.0, 10.0);
        self
    }

    /// Linear gain floor corresponding to `reduction_amount` dB of maximum attenuation.
    pub fn gain_floor(&self) -> f32 {
        10f32.powf(-self.reduction_amount / 20.0)
    }

    /// `alpha = 1 - exp(-3*s)`, `s` the 0..=1 smoothing factor.
    pub fn smoothing_alpha(&self) -> f32 {
        let s = (self.smoothing_factor / 100.0).clamp(0.0, 1.0);
        1.0 - (-3.0 * s).exp()
    }

    pub fn whitening_amount(&self) -> f32 {
        (self.whitening_factor / 100.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_clamped_already() {
        let p = DenoiserParameters::default();
        assert_eq!(p, p.clamped());
    }

    #[test]
    fn gain_floor_matches_reduction_amount() {
        let mut p = DenoiserParameters::default();
        p.reduction_amount = 20.0;
        assert!((p.gain_floor() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn smoothing_alpha_bounds() {
        let mut p = DenoiserParameters::default();
        p.smoothing_factor = 0.0;
        assert!(p.smoothing_alpha().abs() < 1e-6);
        p.smoothing_factor = 100.0;
        assert!(p.smoothing_alpha() > 0.95);
    }
}
