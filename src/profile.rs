//! The manually learned noise profile: three statistics (rolling mean,
//! rolling median, running max) updated simultaneously from the same
//! learning frames, so switching [`crate::params::ProfileMode`] at runtime
//! never requires relearning.
//!
//! Grounded on `original_source/src/shared/utils/spectral_trailing_buffer.c`
//! (ring buffer of recent spectra feeding a median) and
//! `MIN_NUMBER_OF_WINDOWS_NOISE_AVERAGED` / `NUMBER_OF_MEDIAN_SPECTRUM` from
//! `original_source/src/shared/configurations.h`.

const MIN_BLOCKS_AVERAGED: u32 = 5;
const MEDIAN_TRAILING_DEPTH: usize = 5;

/// Fixed-depth FIFO of recent spectra, used to compute a running median per
/// bin without needing the full learning history.
struct TrailingSpectralBuffer {
    size: usize,
    frames: Vec<Vec<f32>>,
    write_pos: usize,
    filled: usize,
    sort_scratch: Vec<f32>,
}

impl TrailingSpectralBuffer {
    fn new(size: usize) -> Self {
        Self {
            size,
            frames: vec![vec![0.0; size]; MEDIAN_TRAILING_DEPTH],
            write_pos: 0,
            filled: 0,
            sort_scratch: vec![0.0; MEDIAN_TRAILING_DEPTH],
        }
    }

    fn reset(&mut self) {
        for f in self.frames.iter_mut() {
            f.fill(0.0);
        }
        self.write_pos = 0;
        self.filled = 0;
    }

    fn push(&mut self, frame: &[f32]) {
        self.frames[self.write_pos].copy_from_slice(frame);
        self.write_pos = (self.write_pos + 1) % MEDIAN_TRAILING_DEPTH;
        self.filled = (self.filled + 1).min(MEDIAN_TRAILING_DEPTH);
    }

    /// Folds this buffer's running median into `out` as the max of the two,
    /// so the stored median profile forms an upper envelope across frames
    /// instead of tracking the most recent window outright.
    fn median_into(&mut self, out: &mut [f32]) {
        let n = self.filled.max(1);
        for k in 0..self.size {
            for (i, v) in self.sort_scratch.iter_mut().take(n).enumerate() {
                *v = self.frames[i][k];
            }
            let slice = &mut self.sort_scratch[..n];
            slice.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let median_of_buffer = if n % 2 == 0 {
                (slice[n / 2 - 1] + slice[n / 2]) / 2.0
            } else {
                slice[n / 2]
            };
            out[k] = out[k].max(median_of_buffer);
        }
    }
}

pub struct NoiseProfile {
    size: usize,
    mean: Vec<f32>,
    median: Vec<f32>,
    max: Vec<f32>,
    trailing: TrailingSpectralBuffer,
    blocks_averaged: u32,
}

impl NoiseProfile {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            mean: vec![0.0; size],
            median: vec![0.0; size],
            max: vec![0.0; size],
            trailing: TrailingSpectralBuffer::new(size),
            blocks_averaged: 0,
        }
    }

    pub fn reset(&mut self) {
        self.mean.fill(0.0);
        self.median.fill(0.0);
        self.max.fill(0.0);
        self.trailing.reset();
        self.blocks_averaged = 0;
    }

    /// Folds one learning frame into all three statistics at once.
    pub fn update(&mut self, frame: &[f32]) -> bool {
        if frame.len() != self.size {
            return false;
        }
        self.blocks_averaged += 1;
        let n = self.blocks_averaged as f32;
        for k in 0..self.size {
            self.mean[k] += (frame[k] - self.mean[k]) / n;
            if frame[k] > self.max[k] {
                self.max[k] = frame[k];
            }
        }
        self.trailing.push(frame);
        self.trailing.median_into(&mut self.median);
        true
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn blocks_averaged(&self) -> u32 {
        self.blocks_averaged
    }

    /// Mean/median need [`MIN_BLOCKS_AVERAGED`] updates before the profile
    /// is trustworthy; the running max is usable after just one.
    pub fn available(&self, mode: crate::params::ProfileMode) -> bool {
        use crate::params::ProfileMode::*;
        match mode {
            RollingMean | Median => self.blocks_averaged >= MIN_BLOCKS_AVERAGED,
            Max => self.blocks_averaged >= 1,
        }
    }

    pub fn for_mode(&self, mode: crate::params::ProfileMode) -> &[f32] {
        use crate::params::ProfileMode::*;
        match mode {
            RollingMean => &self.mean,
            Median => &self.median,
            Max => &self.max,
        }
    }

    pub fn load_for_mode(&mut self, mode: crate::params::ProfileMode, data: &[f32]) -> bool {
        if data.len() != self.size {
            return false;
        }
        use crate::params::ProfileMode::*;
        match mode {
            RollingMean => self.mean.copy_from_slice(data),
            Median => self.median.copy_from_slice(data),
            Max => self.max.copy_from_slice(data),
        }
        if self.blocks_averaged < MIN_BLOCKS_AVERAGED {
            self.blocks_averaged = MIN_BLOCKS_AVERAGED;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ProfileMode;

    #[test]
    fn max_available_after_one_update_mean_needs_five() {
        let mut profile = NoiseProfile::new(4);
        profile.update(&[1.0, 2.0, 3.0, 4.0]);
        assert!(profile.available(ProfileMode::Max));
        assert!(!profile.available(ProfileMode::RollingMean));
        for _ in 0..4 {
            profile.update(&[1.0, 2.0, 3.0, 4.0]);
        }
        assert!(profile.available(ProfileMode::RollingMean));
    }

    #[test]
    fn running_max_never_decreases() {
        let mut profile = NoiseProfile::new(1);
        profile.update(&[5.0]);
        profile.update(&[1.0]);
        assert_eq!(profile.for_mode(ProfileMode::Max)[0], 5.0);
    }

    #[test]
    fn running_median_is_upper_envelope_and_never_decreases() {
        let mut profile = NoiseProfile::new(1);
        profile.update(&[5.0]);
        profile.update(&[1.0]);
        profile.update(&[1.0]);
        profile.update(&[1.0]);
        let after_high = profile.for_mode(ProfileMode::Median)[0];
        for _ in 0..10 {
            profile.update(&[0.1]);
            assert!(profile.for_mode(ProfileMode::Median)[0] >= after_high - 1e-6);
        }
    }

    #[test]
    fn load_for_mode_marks_profile_available() {
        let mut profile = NoiseProfile::new(2);
        assert!(profile.load_for_mode(ProfileMode::RollingMean, &[0.1, 0.2]));
        assert!(profile.available(ProfileMode::RollingMean));
        assert_eq!(profile.for_mode(ProfileMode::RollingMean), &[0.1, 0.2]);
    }

    #[test]
    fn reset_clears_availability() {
        let mut profile = NoiseProfile::new(2);
        profile.update(&[1.0, 1.0]);
        profile.reset();
        assert_eq!(profile.blocks_averaged(), 0);
        assert!(!profile.available(ProfileMode::Max));
    }
}
