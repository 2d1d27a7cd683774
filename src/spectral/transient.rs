//! Conservative transient detector: flags a frame as transient when its
//! total energy jumps well above a short trailing envelope, so the smoother
//! can skip its IIR update for that frame rather than smear an attack.
//!
//! A single energy-envelope-ratio test scoped to the spectral smoother,
//! rather than a per-voice-chain transient gate.

/// A frame counts as transient when its energy exceeds the trailing
/// envelope by more than this ratio.
pub const TRANSIENT_THRESHOLD: f32 = 2.0;

const ENVELOPE_ATTACK: f32 = 0.7;
const ENVELOPE_RELEASE: f32 = 0.05;

pub struct TransientDetector {
    envelope: f32,
}

impl TransientDetector {
    pub fn new() -> Self {
        Self { envelope: 0.0 }
    }

    /// Returns `true` if this frame's power spectrum is transient. Always
    /// updates the trailing envelope, using a slow release so a real
    /// transient doesn't immediately raise the bar for the next frame.
    pub fn detect(&mut self, power: &[f32]) -> bool {
        let energy: f32 = power.iter().sum();
        let is_transient = energy > self.envelope * TRANSIENT_THRESHOLD && self.envelope > 1e-12;

        let rate = if energy > self.envelope {
            ENVELOPE_ATTACK
        } else {
            ENVELOPE_RELEASE
        };
        self.envelope += rate * (energy - self.envelope);

        is_transient
    }
}

impl Default for TransientDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_state_never_flags_transient() {
        let mut d = TransientDetector::new();
        let frame = vec![0.01f32; 16];
        let mut flagged = false;
        for _ in 0..50 {
            if d.detect(&frame) {
                flagged = true;
            }
        }
        assert!(!flagged);
    }

    #[test]
    fn sudden_energy_jump_is_flagged() {
        let mut d = TransientDetector::new();
        let quiet = vec![0.001f32; 16];
        for _ in 0..10 {
            d.detect(&quiet);
        }
        let loud = vec![1.0f32; 16];
        assert!(d.detect(&loud));
    }
}
