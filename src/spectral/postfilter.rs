//! Adaptive-width post-filter: a clamp-to-edge moving average over the gain
//! curve whose window width grows as the SNR threshold margin shrinks, with
//! an optional monotonicity pass that keeps the filtered curve from ever
//! exceeding the unfiltered minimum in a neighborhood (so the filter can
//! only smooth toward more reduction, never less).
//!
//! Grounded on `original_source/src/shared/post_estimation/postfilter.c`'s
//! adaptive window-size rule (`n = 2*round(scale*(1 - zeta/threshold)) + 1`).

pub const POSTFILTER_SCALE: f32 = 10.0;
const MAX_WINDOW: usize = 31;

pub struct PostFilter {
    scratch: Vec<f32>,
}

impl PostFilter {
    pub fn new(real_bins: usize) -> Self {
        Self {
            scratch: vec![0.0; real_bins],
        }
    }

    fn window_size(zeta_db: f32, threshold_db: f32) -> usize {
        let ratio = if threshold_db.abs() < 1e-6 {
            0.0
        } else {
            zeta_db / threshold_db
        };
        let n = 2 * (POSTFILTER_SCALE * (1.0 - ratio)).round().abs() as usize + 1;
        n.clamp(1, MAX_WINDOW)
    }

    /// Smooths `gain` in place given the current SNR margin `zeta_db` and the
    /// configured `threshold_db`. `preserve_minimum` forbids the filtered
    /// value from moving above the local unfiltered minimum.
    pub fn apply(&mut self, gain: &mut [f32], zeta_db: f32, threshold_db: f32, preserve_minimum: bool) {
        let n = gain.len();
        let window = Self::window_size(zeta_db, threshold_db);
        if window <= 1 || n == 0 {
            return;
        }
        self.scratch[..n].copy_from_slice(gain);
        let half = window / 2;
        for i in 0..n {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let slice = &self.scratch[lo..=hi];
            let mut avg = slice.iter().sum::<f32>() / slice.len() as f32;
            if preserve_minimum {
                // The filter may only push gain further down, never relax it
                // back up, so a burst of reduction in the neighborhood can't
                // be diluted away by its quieter neighbors.
                avg = avg.min(self.scratch[i]);
            }
            gain[i] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_margin_at_threshold_gives_window_one() {
        assert_eq!(PostFilter::window_size(0.0, 5.0), 1);
    }

    #[test]
    fn wide_margin_below_threshold_widens_window() {
        let w = PostFilter::window_size(-20.0, 5.0);
        assert!(w > 1);
    }

    #[test]
    fn apply_preserves_length_and_stays_in_unit_range() {
        let mut pf = PostFilter::new(16);
        let mut gain = vec![0.2, 0.9, 0.1, 0.95, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 0.0, 0.1, 0.2, 0.3];
        pf.apply(&mut gain, -5.0, 5.0, true);
        assert_eq!(gain.len(), 16);
        for &g in &gain {
            assert!((0.0..=1.0).contains(&g));
        }
    }
}
