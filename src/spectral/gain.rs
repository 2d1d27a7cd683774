//! Gain rule: turns a (reference, noise, alpha, beta) tuple into a per-bin
//! gain in `[beta_min, 1]`. Three families, all grounded on
//! `original_source/src/shared/gain_estimation/gain_estimators.h`'s naming
//! (`WIENER`, generalized spectral subtraction exponents, hard gates).

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainRule {
    Wiener,
    GeneralizedSubtraction { exponent: f32 },
    HardGate,
}

const EPSILON: f32 = 1e-12;

/// Writes `gain[k]` for every bin into `out`, given per-bin `reference`,
/// `noise`, `alpha` and `beta`.
pub fn compute(rule: GainRule, reference: &[f32], noise: &[f32], alpha: &[f32], beta: &[f32], out: &mut [f32]) {
    let n = reference.len();
    debug_assert_eq!(noise.len(), n);
    debug_assert_eq!(alpha.len(), n);
    debug_assert_eq!(beta.len(), n);
    debug_assert_eq!(out.len(), n);

    for k in 0..n {
        let r = reference[k].max(EPSILON);
        let a = alpha[k];
        let b = beta[k];
        out[k] = match rule {
            GainRule::Wiener => (1.0 - a * noise[k] / r).max(0.0).clamp(0.0, 1.0),
            GainRule::GeneralizedSubtraction { exponent } => {
                let ref_p = r.powf(exponent);
                let noise_p = (a * noise[k]).max(0.0).powf(exponent);
                ((ref_p - noise_p) / ref_p).max(0.0).clamp(0.0, 1.0)
            }
            GainRule::HardGate => {
                if reference[k] > a * noise[k] {
                    1.0
                } else {
                    b
                }
            }
        }
        .max(b);
    }
}
