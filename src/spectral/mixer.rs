//! Denoise mixer: combines the input spectrum with the computed gain curve
//! in either normal (denoised output) or residual-listen (what got removed)
//! mode, and enforces the noise floor as a final per-bin clamp.
//!
//! Grounded on the interface in
//! `original_source/src/shared/utils/denoise_mixer.h` (the pack carries
//! only the header, not `denoise_mixer.c`); the body is new code written
//! against that header's `denoise_mixer_run(fft_spectrum, gain_spectrum,
//! DenoiseMixerParameters { noise_level, residual_listen, whitening_amount
//! })` shape.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixMode {
    Normal,
    ResidualListen,
}

pub struct DenoiseMixer;

impl DenoiseMixer {
    /// Applies `gain` (clamped against `floor`) to `spectrum` in place,
    /// scaling the mirrored imaginary half identically to the real half so
    /// phase is preserved exactly.
    pub fn apply(spectrum: &mut [f32], gain: &[f32], floor: &[f32], mode: MixMode, fft_size: usize) {
        let real_bins = gain.len();
        debug_assert_eq!(floor.len(), real_bins);
        debug_assert_eq!(spectrum.len(), fft_size);
        for k in 0..real_bins {
            let g = gain[k].max(floor[k]).clamp(0.0, 1.0);
            let applied = match mode {
                MixMode::Normal => g,
                MixMode::ResidualListen => 1.0 - g,
            };
            spectrum[k] *= applied;
            if k != 0 && k != real_bins - 1 {
                spectrum[fft_size - k] *= applied;
            }
        }
    }
}
