//! Power / magnitude / phase extraction from the packed half-spectrum.
//! DC and Nyquist bins are purely real; every other bin's real part lives at
//! `packed[k]` and its mirrored imaginary part at `packed[fft_size - k]`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumType {
    Power,
    Magnitude,
    Phase,
}

fn bin_parts(packed: &[f32], fft_size: usize, k: usize, real_bins: usize) -> (f32, f32) {
    if k == 0 || k == real_bins - 1 {
        (packed[k], 0.0)
    } else {
        (packed[k], packed[fft_size - k])
    }
}

/// Writes `real_bins` spectral feature values of `kind` into `out`.
pub fn extract(packed: &[f32], fft_size: usize, kind: SpectrumType, out: &mut [f32]) {
    let real_bins = fft_size / 2 + 1;
    debug_assert_eq!(out.len(), real_bins);
    for k in 0..real_bins {
        let (re, im) = bin_parts(packed, fft_size, k, real_bins);
        out[k] = match kind {
            SpectrumType::Power => re * re + im * im,
            SpectrumType::Magnitude => (re * re + im * im).sqrt(),
            SpectrumType::Phase => im.atan2(re),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::fft::FftTransform;

    #[test]
    fn power_is_square_of_magnitude() {
        let n = 32;
        let mut xf = FftTransform::new(n);
        let input: Vec<f32> = (0..n).map(|i| (i as f32 * 0.4).sin()).collect();
        xf.load_centered(&input);
        let mut packed = vec![0.0f32; n];
        xf.forward(&mut packed);

        let real_bins = n / 2 + 1;
        let mut power = vec![0.0f32; real_bins];
        let mut mag = vec![0.0f32; real_bins];
        extract(&packed, n, SpectrumType::Power, &mut power);
        extract(&packed, n, SpectrumType::Magnitude, &mut mag);
        for k in 0..real_bins {
            assert!((power[k] - mag[k] * mag[k]).abs() < 1e-4);
        }
    }

    #[test]
    fn dc_and_nyquist_phase_is_zero_or_pi() {
        let n = 16;
        let mut xf = FftTransform::new(n);
        let input = vec![1.0f32; n];
        xf.load_centered(&input);
        let mut packed = vec![0.0f32; n];
        xf.forward(&mut packed);
        let real_bins = n / 2 + 1;
        let mut phase = vec![0.0f32; real_bins];
        extract(&packed, n, SpectrumType::Phase, &mut phase);
        assert!(phase[0].abs() < 1e-4 || (phase[0].abs() - std::f32::consts::PI).abs() < 1e-4);
    }
}
