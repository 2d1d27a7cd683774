//! Trimmed-mean noise power estimator (Brandt 2017): keeps a per-bin
//! circular history and averages its lowest percentile, correcting for the
//! bias a trimmed mean of an exponential distribution introduces.
//!
//! The base algorithm is grounded on
//! `original_source/src/shared/noise_estimation/brandt_noise_estimator.c`.
//! The percentile-confidence gate below has no counterpart there: it is an
//! extension that evaluates five candidate percentiles per bin and commits
//! to whichever gives the flattest (lowest-dispersion) trimmed slice,
//! falling back to the configured default percentile when no candidate is
//! confident enough. An Anderson-Darling-style normality check was
//! considered and rejected as too expensive for a per-bin, per-frame
//! decision; coefficient-of-variation dispersion approximates the same
//! "is this slice a clean noise floor" question far more cheaply.

const SILENCE_THRESHOLD: f32 = 1e-8;
const MIN_HISTORY_FRAMES: usize = 16;
const BIAS_EPSILON: f32 = 1e-6;
const CANDIDATE_MULTIPLIERS: [f32; 5] = [0.5, 0.75, 1.0, 1.25, 1.5];
const CONFIDENCE_GATE: f32 = 0.5;

fn correction_factor(p: f32) -> f32 {
    if p <= 0.0 || p >= 1.0 {
        return 1.0;
    }
    let term = (1.0 - p) / p * (1.0 - p).ln();
    let denominator = 1.0 + term;
    if denominator.abs() < BIAS_EPSILON {
        1.0
    } else {
        1.0 / denominator
    }
}

pub struct TrimmedMean {
    size: usize,
    history_size: usize,
    history_index: usize,
    history: Vec<f32>, // size * history_size
    sort_scratch: Vec<f32>,
    percentile: f32,
    correction: f32,
    is_first_frame: bool,
}

impl TrimmedMean {
    pub fn new(size: usize, percentile: f32) -> Self {
        let percentile = percentile.clamp(0.01, 0.9);
        // Should be duration_ms * sample_rate / (hop * 1000), but no
        // duration is plumbed through this constructor's callers yet.
        let history_size = MIN_HISTORY_FRAMES;
        Self {
            size,
            history_size,
            history_index: 0,
            history: vec![0.0; size * history_size],
            sort_scratch: vec![0.0; history_size],
            percentile,
            correction: correction_factor(percentile),
            is_first_frame: true,
        }
    }

    fn bin_history(&self, k: usize) -> &[f32] {
        &self.history[k * self.history_size..(k + 1) * self.history_size]
    }

    fn bin_history_mut(&mut self, k: usize) -> &mut [f32] {
        &mut self.history[k * self.history_size..(k + 1) * self.history_size]
    }

    /// Evaluates the five candidate percentiles against the sorted history
    /// for one bin, returning the chosen trimmed mean and its confidence.
    fn best_candidate(&self, sorted: &[f32]) -> (f32, f32) {
        let h = sorted.len() as f32;
        let mut best_mean = 0.0f32;
        let mut best_score = -1.0f32;
        let mut default_mean = 0.0f32;
        for &mult in CANDIDATE_MULTIPLIERS.iter() {
            let p = (self.percentile * mult).clamp(0.01, 0.99);
            let trim_count = ((h * p).round() as usize).clamp(1, sorted.len());
            let slice = &sorted[..trim_count];
            let mean = slice.iter().sum::<f32>() / trim_count as f32;
            let variance = slice.iter().map(|&v| (v - mean).powi(2)).sum::<f32>()
                / trim_count as f32;
            let cv = variance.sqrt() / mean.max(1e-20);
            let score = 1.0 / (1.0 + cv); // squashed dispersion: 1 = perfectly flat
            if (mult - 1.0).abs() < 1e-6 {
                default_mean = mean;
            }
            if score > best_score {
                best_score = score;
                best_mean = mean;
            }
        }
        if best_score >= CONFIDENCE_GATE {
            (best_mean, best_score)
        } else {
            (default_mean, best_score)
        }
    }

    pub fn run(&mut self, spectrum: &[f32], noise_spectrum: &mut [f32]) -> bool {
        if spectrum.len() != self.size || noise_spectrum.len() != self.size {
            return false;
        }
        let frame_energy = spectrum.iter().sum::<f32>() / self.size as f32;
        let inverse_factor = 1.0 / self.correction;

        if self.is_first_frame {
            if frame_energy < SILENCE_THRESHOLD {
                noise_spectrum.fill(0.0);
                return true;
            }
            for k in 0..self.size {
                let val = spectrum[k] * inverse_factor;
                self.bin_history_mut(k).fill(val);
            }
            self.is_first_frame = false;
        } else if frame_energy >= SILENCE_THRESHOLD {
            let idx = self.history_index;
            for k in 0..self.size {
                self.bin_history_mut(k)[idx] = spectrum[k];
            }
            self.history_index = (self.history_index + 1) % self.history_size;
        }

        for k in 0..self.size {
            let range = k * self.history_size..(k + 1) * self.history_size;
            self.sort_scratch.copy_from_slice(&self.history[range]);
            self.sort_scratch
                .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let (mean, _confidence) = self.best_candidate(&self.sort_scratch);
            noise_spectrum[k] = mean * self.correction;
        }
        true
    }

    pub fn set_state(&mut self, initial_profile: &[f32]) {
        let inverse_factor = 1.0 / self.correction;
        for k in 0..self.size {
            let val = initial_profile[k] * inverse_factor;
            self.bin_history_mut(k).fill(val);
        }
        self.is_first_frame = false;
    }

    pub fn update_seed(&mut self, seed_profile: &[f32]) {
        self.set_state(seed_profile);
    }

    pub fn apply_floor(&mut self, floor_profile: &[f32]) {
        let inverse_factor = 1.0 / self.correction;
        for k in 0..self.size {
            let floor_val = floor_profile[k] * inverse_factor;
            for v in self.bin_history_mut(k).iter_mut() {
                if *v < floor_val {
                    *v = floor_val;
                }
            }
        }
    }
}
