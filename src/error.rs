//! Error types for the construction/configuration boundary.
//!
//! Per-sample and per-frame internals stay on plain `bool`/`Option` returns —
//! see the module docs on [`crate::denoiser`] for why `Result` never appears
//! on the audio-thread hot path.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum DenoiserError {
    #[error("sample rate must be > 0 and <= 192000 Hz, got {0}")]
    InvalidSampleRate(u32),

    #[error("frame size must be > 0 ms, got {0}")]
    InvalidFrameSize(f32),

    #[error("noise profile mode must be 1, 2 or 3, got {0}")]
    InvalidProfileMode(i32),

    #[error("noise profile size mismatch: expected {expected}, got {got}")]
    ProfileSizeMismatch { expected: usize, got: usize },

    #[error("noise estimation method must be 0, 1 or 2, got {0}")]
    InvalidEstimationMethod(i32),

    #[error("noise scaling type must be 0, 1, 2 or 3, got {0}")]
    InvalidScalingType(i32),
}

pub type DenoiserResult<T> = Result<T, DenoiserError>;
