//! The three top-level processors (manual, adaptive, 2-D/NLM) share this
//! module's [`SpectralDenoiser`] trait for their common surface
//! (`process`, `get_latency`, `reset`) while keeping independent state
//! shapes, per the "tagged variants, not a union" decision recorded in
//! DESIGN.md.

pub mod adaptive;
pub mod core;
pub mod manual;
pub mod nlm_denoiser;

use crate::error::DenoiserResult;
use crate::params::DenoiserParameters;

pub trait SpectralDenoiser {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool;
    fn load_parameters(&mut self, params: DenoiserParameters) -> DenoiserResult<()>;
    fn get_latency(&self) -> usize;
    fn reset(&mut self);
}

pub use adaptive::AdaptiveDenoiser;
pub use manual::ManualDenoiser;
pub use nlm_denoiser::NlmDenoiser;

pub(crate) fn frame_samples_for(sample_rate: u32, frame_ms: f32) -> usize {
    ((sample_rate as f32) * frame_ms / 1000.0).round().max(2.0) as usize
}
