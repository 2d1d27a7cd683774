//! The STFT streaming frontend: circular input assembly, analysis window,
//! forward transform, caller-supplied frame callback, inverse transform,
//! synthesis window, overlap-add, circular output.
//!
//! Ring-buffer-backed and `rustfft`-driven, generalized from a hardwired
//! gain-multiply callback to an arbitrary per-frame closure so the transport
//! stays independent of whatever spectral algorithm runs inside it.

use super::fft::FftTransform;
use super::window::WindowPair;
use ringbuf::{Consumer, Producer, RingBuffer};

pub struct StftFrontend {
    frame_samples: usize,
    hop: usize,

    input_producer: Producer<f32>,
    input_consumer: Consumer<f32>,
    output_producer: Producer<f32>,
    output_consumer: Consumer<f32>,

    windows: WindowPair,
    fft: FftTransform,

    frame_buf: Vec<f32>,
    packed: Vec<f32>,
    synth_buf: Vec<f32>,
    accumulator: Vec<f32>,

    since_last_hop: usize,
}

impl StftFrontend {
    pub fn new(frame_samples: usize, hop: usize, windows: WindowPair, fft: FftTransform) -> Self {
        assert!(hop > 0 && hop <= frame_samples);
        let cap = (frame_samples + hop) * 4;
        let (mut in_prod, in_cons) = RingBuffer::<f32>::new(cap).split();
        let (mut out_prod, out_cons) = RingBuffer::<f32>::new(cap).split();

        // Priming the input with one frame of silence and the output with
        // `frame_samples` zeros gives exactly the latency the contract
        // requires: the first `frame_samples` output samples are silence,
        // and the first real frame callback fires once `hop` real samples
        // have arrived.
        for _ in 0..frame_samples {
            let _ = in_prod.push(0.0);
            let _ = out_prod.push(0.0);
        }

        Self {
            frame_samples,
            hop,
            input_producer: in_prod,
            input_consumer: in_cons,
            output_producer: out_prod,
            output_consumer: out_cons,
            windows,
            fft,
            frame_buf: vec![0.0; frame_samples],
            packed: vec![0.0; 0],
            synth_buf: vec![0.0; frame_samples],
            accumulator: vec![0.0; frame_samples],
            since_last_hop: 0,
        }
        .with_packed_sized()
    }

    fn with_packed_sized(mut self) -> Self {
        self.packed = vec![0.0; self.fft.fft_size()];
        self
    }

    pub fn latency_samples(&self) -> usize {
        self.frame_samples
    }

    pub fn hop_samples(&self) -> usize {
        self.hop
    }

    pub fn real_bins(&self) -> usize {
        self.fft.real_bins()
    }

    /// Processes `n_samples` input samples into `output` (same length),
    /// invoking `callback` on the packed half-spectrum every `hop` samples.
    /// Returns `false` without side effects on null/zero-length buffers,
    /// matching the no-allocation, no-partial-write failure contract.
    pub fn process<F>(&mut self, input: &[f32], output: &mut [f32], mut callback: F) -> bool
    where
        F: FnMut(&mut [f32]),
    {
        if input.is_empty() || output.len() != input.len() {
            return false;
        }
        for (i, &x) in input.iter().enumerate() {
            let _ = self.input_producer.push(x);
            output[i] = self.output_consumer.pop().unwrap_or(0.0);
            self.since_last_hop += 1;
            if self.since_last_hop == self.hop {
                self.since_last_hop = 0;
                self.run_frame(&mut callback);
            }
        }
        true
    }

    fn run_frame<F>(&mut self, callback: &mut F)
    where
        F: FnMut(&mut [f32]),
    {
        for (i, v) in self
            .input_consumer
            .iter()
            .take(self.frame_samples)
            .enumerate()
        {
            self.frame_buf[i] = *v * self.windows.analysis[i];
        }

        self.fft.load_centered(&self.frame_buf);
        self.fft.forward(&mut self.packed);

        callback(&mut self.packed);

        self.fft
            .backward_centered(&self.packed, self.frame_samples, &mut self.synth_buf);

        for i in 0..self.frame_samples {
            self.accumulator[i] += self.synth_buf[i] * self.windows.synthesis[i];
        }

        for &v in self.accumulator.iter().take(self.hop) {
            let _ = self.output_producer.push(v);
        }
        self.accumulator.rotate_left(self.hop);
        for v in self.accumulator.iter_mut().skip(self.frame_samples - self.hop) {
            *v = 0.0;
        }

        self.input_consumer.discard(self.hop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::window::WindowType;

    fn make_frontend(frame_samples: usize, hop: usize) -> StftFrontend {
        let fft = FftTransform::new(frame_samples);
        let windows = WindowPair::new(WindowType::Hann, frame_samples);
        StftFrontend::new(frame_samples, hop, windows, fft)
    }

    #[test]
    fn latency_is_frame_samples() {
        let fe = make_frontend(64, 16);
        assert_eq!(fe.latency_samples(), 64);
    }

    #[test]
    fn passthrough_callback_reconstructs_input_after_latency() {
        let frame = 64;
        let hop = 16;
        let mut fe = make_frontend(frame, hop);
        let n = 400;
        let input: Vec<f32> = (0..n).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let mut output = vec![0.0f32; n];
        fe.process(&input, &mut output, |_packed| {});

        let latency = fe.latency_samples();
        let mut max_err = 0.0f32;
        for i in 0..(n - latency - frame) {
            let err = (output[i + latency] - input[i]).abs();
            max_err = max_err.max(err);
        }
        assert!(max_err < 5e-2, "max reconstruction error {}", max_err);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let mut fe = make_frontend(32, 8);
        let input = vec![0.0f32; 10];
        let mut output = vec![0.0f32; 5];
        assert!(!fe.process(&input, &mut output, |_| {}));
    }
}
