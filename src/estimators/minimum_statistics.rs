//! Minimum statistics noise power estimator (Martin 2001): tracks the
//! running minimum of a smoothed power spectrum across overlapping
//! sub-windows and scales it back up by a bias-correction factor to
//! recover an unbiased noise power estimate.
//!
//! Grounded on `original_source/src/shared/noise_estimation/martin_noise_estimator.c`.

const SILENCE_THRESHOLD: f32 = 1e-8;
const SMOOTH_ALPHA: f32 = 0.9;
const SUBWINDOW_LEN: u32 = 24;
const SUBWINDOW_COUNT: usize = 8;
const BIAS_CORRECTION: f32 = 1.5;

pub struct MinimumStatistics {
    size: usize,
    smoothed_psd: Vec<f32>,
    current_subwin_min: Vec<f32>,
    subwin_history: Vec<f32>, // size * SUBWINDOW_COUNT
    frame_count: u32,
    subwin_index: usize,
    is_first_frame: bool,
}

impl MinimumStatistics {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            smoothed_psd: vec![0.0; size],
            current_subwin_min: vec![0.0; size],
            subwin_history: vec![0.0; size * SUBWINDOW_COUNT],
            frame_count: 0,
            subwin_index: 0,
            is_first_frame: true,
        }
    }

    fn history_mut(&mut self, k: usize, d: usize) -> &mut f32 {
        &mut self.subwin_history[k * SUBWINDOW_COUNT + d]
    }

    fn history(&self, k: usize, d: usize) -> f32 {
        self.subwin_history[k * SUBWINDOW_COUNT + d]
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
            for k in 0..self.size {
                let val = spectrum[k] / BIAS_CORRECTION;
                self.smoothed_psd[k] = val;
                self.current_subwin_min[k] = val;
                for d in 0..SUBWINDOW_COUNT {
                    *self.history_mut(k, d) = val;
                }
                noise_spectrum[k] = spectrum[k];
            }
            self.is_first_frame = false;
            self.frame_count = 1;
            return true;
        }

        if frame_energy >= SILENCE_THRESHOLD {
            for k in 0..self.size {
                self.smoothed_psd[k] =
                    SMOOTH_ALPHA * self.smoothed_psd[k] + (1.0 - SMOOTH_ALPHA) * spectrum[k];
                if self.smoothed_psd[k] < self.current_subwin_min[k] {
                    self.current_subwin_min[k] = self.smoothed_psd[k];
                }
            }

            if self.frame_count >= SUBWINDOW_LEN {
                for k in 0..self.size {
                    *self.history_mut(k, self.subwin_index) = self.current_subwin_min[k];
                    self.current_subwin_min[k] = self.smoothed_psd[k];
                }
                self.subwin_index = (self.subwin_index + 1) % SUBWINDOW_COUNT;
                self.frame_count = 0;
            }
        }

        for k in 0..self.size {
            let mut min_val = self.current_subwin_min[k];
            for d in 0..SUBWINDOW_COUNT {
                let h = self.history(k, d);
                if h < min_val {
                    min_val = h;
                }
            }
            noise_spectrum[k] = min_val * BIAS_CORRECTION;
        }

        self.frame_count += 1;
        true
    }

    pub fn set_state(&mut self, initial_profile: &[f32]) {
        for k in 0..self.size {
            let val = initial_profile[k].max(f32::MIN_POSITIVE) / BIAS_CORRECTION;
            self.smoothed_psd[k] = val;
            self.current_subwin_min[k] = val;
            for d in 0..SUBWINDOW_COUNT {
                *self.history_mut(k, d) = val;
            }
        }
        self.is_first_frame = false;
        self.frame_count = 0;
    }

    pub fn update_seed(&mut self, seed_profile: &[f32]) {
        self.set_state(seed_profile);
    }

    pub fn apply_floor(&mut self, floor_profile: &[f32]) {
        for k in 0..self.size {
            let floor_val = floor_profile[k];
            if self.smoothed_psd[k] < floor_val {
                self.smoothed_psd[k] = floor_val;
            }
            if self.current_subwin_min[k] < floor_val {
                self.current_subwin_min[k] = floor_val;
            }
            for d in 0..SUBWINDOW_COUNT {
                if self.history(k, d) < floor_val {
                    *self.history_mut(k, d) = floor_val;
                }
            }
        }
    }
}
