//! The adaptive noise estimators share one contract — `run`, `set_state`,
//! `update_seed`, `apply_floor` — grounded on the uniform shape of
//! `martin_noise_estimator.c`, `spp_mmse_noise_estimator.c` and
//! `brandt_noise_estimator.c`. [`AdaptiveEstimator`] dispatches to whichever
//! concrete estimator the current parameters select; switching methods
//! rebuilds the active variant from scratch rather than keeping all three
//! warm, since method changes are configuration events, not hot-path calls.

pub mod minimum_statistics;
pub mod spp_mmse;
pub mod trimmed_mean;

use crate::params::EstimationMethod;
use minimum_statistics::MinimumStatistics;
use spp_mmse::SppMmse;
use trimmed_mean::TrimmedMean;

pub const DEFAULT_TRIMMED_MEAN_PERCENTILE: f32 = 0.1;

pub enum AdaptiveEstimator {
    MinimumStatistics(MinimumStatistics),
    SppMmse(SppMmse),
    TrimmedMean(TrimmedMean),
}

impl AdaptiveEstimator {
    pub fn new(method: EstimationMethod, size: usize) -> Self {
        match method {
            EstimationMethod::MinimumStatistics => {
                Self::MinimumStatistics(MinimumStatistics::new(size))
            }
            EstimationMethod::SppMmse => Self::SppMmse(SppMmse::new(size)),
            EstimationMethod::TrimmedMean => {
                Self::TrimmedMean(TrimmedMean::new(size, DEFAULT_TRIMMED_MEAN_PERCENTILE))
            }
        }
    }

    pub fn method(&self) -> EstimationMethod {
        match self {
            Self::MinimumStatistics(_) => EstimationMethod::MinimumStatistics,
            Self::SppMmse(_) => EstimationMethod::SppMmse,
            Self::TrimmedMean(_) => EstimationMethod::TrimmedMean,
        }
    }

    pub fn run(&mut self, spectrum: &[f32], noise_spectrum: &mut [f32]) -> bool {
        match self {
            Self::MinimumStatistics(e) => e.run(spectrum, noise_spectrum),
            Self::SppMmse(e) => e.run(spectrum, noise_spectrum),
            Self::TrimmedMean(e) => e.run(spectrum, noise_spectrum),
        }
    }

    pub fn set_state(&mut self, initial_profile: &[f32]) {
        match self {
            Self::MinimumStatistics(e) => e.set_state(initial_profile),
            Self::SppMmse(e) => e.set_state(initial_profile),
            Self::TrimmedMean(e) => e.set_state(initial_profile),
        }
    }

    pub fn update_seed(&mut self, seed_profile: &[f32]) {
        match self {
            Self::MinimumStatistics(e) => e.update_seed(seed_profile),
            Self::SppMmse(e) => e.update_seed(seed_profile),
            Self::TrimmedMean(e) => e.update_seed(seed_profile),
        }
    }

    pub fn apply_floor(&mut self, floor_profile: &[f32]) {
        match self {
            Self::MinimumStatistics(e) => e.apply_floor(floor_profile),
            Self::SppMmse(e) => e.apply_floor(floor_profile),
            Self::TrimmedMean(e) => e.apply_floor(floor_profile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_method_rebuilds_with_matching_identity() {
        let mut est = AdaptiveEstimator::new(EstimationMethod::SppMmse, 4);
        assert_eq!(est.method(), EstimationMethod::SppMmse);
        est = AdaptiveEstimator::new(EstimationMethod::MinimumStatistics, 4);
        assert_eq!(est.method(), EstimationMethod::MinimumStatistics);
    }

    #[test]
    fn all_variants_accept_a_run_call() {
        for method in [
            EstimationMethod::SppMmse,
            EstimationMethod::TrimmedMean,
            EstimationMethod::MinimumStatistics,
        ] {
            let mut est = AdaptiveEstimator::new(method, 4);
            let spectrum = vec![0.1f32; 4];
            let mut out = vec![0.0f32; 4];
            assert!(est.run(&spectrum, &mut out));
        }
    }
}
