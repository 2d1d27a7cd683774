//! Real-time, single-channel spectral noise reduction.
//!
//! Three independent top-level processors share a common gain pipeline:
//!
//! - [`denoiser::ManualDenoiser`] learns a noise profile on demand and
//!   reduces against it, optionally layering an adaptive estimator on top.
//! - [`denoiser::AdaptiveDenoiser`] runs one of three adaptive noise
//!   estimators continuously, with no learning phase.
//! - [`denoiser::NlmDenoiser`] adds non-local-means smoothing over the
//!   per-bin SNR surface, at the cost of extra look-ahead latency.
//!
//! All three implement [`denoiser::SpectralDenoiser`] for their shared
//! `process`/`get_latency`/`reset` surface.

pub mod denoiser;
pub mod error;
pub mod estimators;
pub mod params;
pub mod profile;
pub mod spectral;

pub use denoiser::{AdaptiveDenoiser, ManualDenoiser, NlmDenoiser, SpectralDenoiser};
pub use error::{DenoiserError, DenoiserResult};
pub use params::{DenoiserParameters, EstimationMethod, NoiseScalingType, ProfileMode};
