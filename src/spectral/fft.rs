//! Real-to-real FFT transform over a packed half-spectrum, built on top of
//! `rustfft`'s complex transform rather than a dedicated real-FFT crate: it
//! always goes through `rustfft::Fft<f32>` on a `Complex<f32>` scratch
//! buffer and restores conjugate symmetry by hand.
//!
//! Packed layout of an `N`-element real array: index 0 is DC, indices
//! `1..N/2` hold real parts, indices `N/2+1..N` hold the mirrored imaginary
//! parts, index `N/2` is Nyquist (purely real). No stage but this one ever
//! touches the mirrored imaginary half.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroPadding {
    /// Round the frame length up to the next even number.
    None,
    NextPowerOfTwo,
    /// Round `frame + amount` up to the next even number.
    Fixed(usize),
}

fn next_even(n: usize) -> usize {
    if n % 2 == 0 {
        n
    } else {
        n + 1
    }
}

fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two()
}

pub fn fft_size_for(frame_samples: usize, padding: ZeroPadding) -> usize {
    match padding {
        ZeroPadding::None => next_even(frame_samples),
        ZeroPadding::NextPowerOfTwo => next_power_of_two(frame_samples),
        ZeroPadding::Fixed(amount) => next_even(frame_samples + amount),
    }
}

/// Owns pre-planned forward/backward transforms and scratch buffers of
/// length `fft_size`. Plans are created once at construction; there is no
/// reconfiguration path because `fft_size` is fixed for the processor's
/// lifetime (per the ownership rules, all heap allocation happens at
/// construction).
pub struct FftTransform {
    fft_size: usize,
    real_bins: usize,
    forward: Arc<dyn Fft<f32>>,
    backward: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FftTransform {
    pub fn new(fft_size: usize) -> Self {
        assert!(fft_size >= 2 && fft_size % 2 == 0, "fft_size must be even");
        let mut planner = FftPlanner::<f32>::new();
        Self {
            fft_size,
            real_bins: fft_size / 2 + 1,
            forward: planner.plan_fft_forward(fft_size),
            backward: planner.plan_fft_inverse(fft_size),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn real_bins(&self) -> usize {
        self.real_bins
    }

    /// Centered load: writes `frame` (length <= fft_size) into the transform's
    /// time-domain scratch, centered so padding is symmetric, matching the
    /// `(N - frame) / 2` shift the reference transform uses around FFTW's
    /// in-place buffer.
    pub fn load_centered(&mut self, frame: &[f32]) {
        debug_assert!(frame.len() <= self.fft_size);
        for c in self.scratch.iter_mut() {
            *c = Complex::new(0.0, 0.0);
        }
        let copy_position = (self.fft_size - frame.len()) / 2;
        for (i, &x) in frame.iter().enumerate() {
            self.scratch[copy_position + i].re = x;
        }
    }

    /// Forward transform in place, packing the result into `packed` (length
    /// `fft_size`) using the packed half-spectrum layout.
    pub fn forward(&mut self, packed: &mut [f32]) {
        debug_assert_eq!(packed.len(), self.fft_size);
        self.forward.process(&mut self.scratch);
        let nyq = self.fft_size / 2;
        packed[0] = self.scratch[0].re;
        packed[nyq] = self.scratch[nyq].re;
        for k in 1..nyq {
            packed[k] = self.scratch[k].re;
            packed[self.fft_size - k] = self.scratch[k].im;
        }
    }

    /// Unpacks `packed` into the complex scratch buffer (restoring conjugate
    /// symmetry) and runs the inverse transform. Centered-store divides by
    /// `fft_size` and copies the centered window of length `frame_len` back
    /// out of the scratch buffer.
    pub fn backward_centered(&mut self, packed: &[f32], frame_len: usize, out: &mut [f32]) {
        debug_assert_eq!(packed.len(), self.fft_size);
        debug_assert!(frame_len <= self.fft_size);
        let nyq = self.fft_size / 2;
        self.scratch[0] = Complex::new(packed[0], 0.0);
        self.scratch[nyq] = Complex::new(packed[nyq], 0.0);
        for k in 1..nyq {
            let re = packed[k];
            let im = packed[self.fft_size - k];
            self.scratch[k] = Complex::new(re, im);
            self.scratch[self.fft_size - k] = Complex::new(re, -im);
        }
        self.backward.process(&mut self.scratch);
        let norm = 1.0 / self.fft_size as f32;
        let copy_position = (self.fft_size - frame_len) / 2;
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.scratch[copy_position + i].re * norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft_size_policies() {
        assert_eq!(fft_size_for(441, ZeroPadding::None), 442);
        assert_eq!(fft_size_for(442, ZeroPadding::None), 442);
        assert_eq!(fft_size_for(500, ZeroPadding::NextPowerOfTwo), 512);
        assert_eq!(fft_size_for(441, ZeroPadding::Fixed(50)), 492);
    }

    #[test]
    fn round_trip_reconstructs_input() {
        let n = 64;
        let mut xf = FftTransform::new(n);
        let input: Vec<f32> = (0..n)
            .map(|i| (i as f32 * 0.3).sin() + 0.5 * (i as f32 * 0.7).cos())
            .collect();
        xf.load_centered(&input);
        let mut packed = vec![0.0f32; n];
        xf.forward(&mut packed);
        let mut out = vec![0.0f32; n];
        xf.backward_centered(&packed, n, &mut out);
        for (a, b) in input.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
        }
    }

    #[test]
    fn centered_padding_is_symmetric() {
        let n = 16;
        let mut xf = FftTransform::new(n);
        let input = vec![1.0f32; 8];
        xf.load_centered(&input);
        let mut packed = vec![0.0f32; n];
        xf.forward(&mut packed);
        let mut out = vec![0.0f32; 8];
        xf.backward_centered(&packed, 8, &mut out);
        for v in out {
            assert!((v - 1.0).abs() < 1e-4);
        }
    }
}
