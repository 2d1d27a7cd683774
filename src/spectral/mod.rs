//! The spectral-domain building blocks shared by every top-level processor:
//! transform, windowing, streaming frontend, feature extraction,
//! perceptual analysis, and the gain-shaping stages that turn a noise
//! estimate into an applied spectrum.

pub mod critical_bands;
pub mod features;
pub mod fft;
pub mod gain;
pub mod masking;
pub mod mixer;
pub mod nlm;
pub mod noise_floor;
pub mod noise_scaling;
pub mod postfilter;
pub mod smoother;
pub mod stft;
pub mod transient;
pub mod window;
