//! Streaming short-time Fourier processing with overlap-add resynthesis.
//!
//! [`SpectralProcessor`] turns arbitrary-length stereo blocks into a stream
//! of fixed-size, 50%-overlapped frames. For each frame it applies a sine
//! analysis window, transforms, hands bins `0..=N/2` to a caller-supplied
//! operation, inverse-transforms, applies the same window again and
//! overlap-adds into an accumulator. Only samples no longer touched by a
//! later frame are released.
//!
//! ```text
//! input ─▶ pending ──(N samples)──▶ window·FFT ─▶ op(bins) ─▶ IFFT·window ─▶ accum
//!              ▲ keep N-hop                                             │ first hop
//!              └──────────────── advance by hop ◀───────────── ready ◀──┘
//! ```
//!
//! The pending buffer is primed with `N - hop` zeros and the ready queue with
//! `hop` zeros, so every call can return exactly the number of frames it was
//! given. The total delay is exactly `N` samples. With an identity operation
//! the output equals the input delayed by `N`, up to floating-point error.

use std::collections::VecDeque;

use rustfft::num_complex::Complex;

use crate::buffer::StereoBuffer;
use crate::fft::{Fft, Window, mirror_conjugate};

struct ChannelState {
    pending: Vec<f32>,
    accum: Vec<f32>,
    ready: VecDeque<f32>,
}

impl ChannelState {
    fn new(size: usize, hop: usize) -> Self {
        let mut state = Self {
            pending: Vec::with_capacity(size * 2),
            accum: vec![0.0; size],
            ready: VecDeque::with_capacity(size * 2),
        };
        state.prime(size, hop);
        state
    }

    fn prime(&mut self, size: usize, hop: usize) {
        self.pending.clear();
        self.pending.resize(size - hop, 0.0);
        self.accum.fill(0.0);
        self.ready.clear();
        self.ready.extend(core::iter::repeat_n(0.0, hop));
    }
}

/// Stereo STFT engine with a 50%-overlap sine window.
pub struct SpectralProcessor {
    fft: Fft,
    window: Vec<f32>,
    size: usize,
    hop: usize,
    frame: Vec<Complex<f32>>,
    channels: [ChannelState; 2],
}

impl SpectralProcessor {
    /// Creates a processor with frame size `size` (rounded up to an even
    /// power of two, minimum 4) and hop `size / 2`.
    pub fn new(size: usize) -> Self {
        let size = size.max(4).next_power_of_two();
        let hop = size / 2;
        Self {
            fft: Fft::new(size),
            window: Window::Sine.coefficients(size),
            size,
            hop,
            frame: vec![Complex::new(0.0, 0.0); size],
            channels: [ChannelState::new(size, hop), ChannelState::new(size, hop)],
        }
    }

    /// Frame size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Hop between frames.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of bins passed to the operation (`size / 2 + 1`).
    pub fn bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Delay between input and output in samples.
    pub fn latency(&self) -> usize {
        self.size
    }

    /// Clears all buffered audio.
    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.prime(self.size, self.hop);
        }
    }

    /// Processes one block and returns a block of the same length.
    ///
    /// `op(channel, bins)` is called once per channel per completed frame,
    /// left then right, so an operation that updates state on `channel == 0`
    /// applies the same state to both channels of a frame.
    pub fn process<F>(&mut self, input: &StereoBuffer, mut op: F) -> StereoBuffer
    where
        F: FnMut(usize, &mut [Complex<f32>]),
    {
        let frames = input.len();
        let Self {
            fft,
            window,
            size,
            hop,
            frame,
            channels,
        } = self;
        let (size, hop) = (*size, *hop);

        channels[0].pending.extend_from_slice(&input.left);
        channels[1].pending.extend_from_slice(&input.right);

        while channels[0].pending.len() >= size {
            for (index, ch) in channels.iter_mut().enumerate() {
                for ((bin, &x), &w) in frame.iter_mut().zip(&ch.pending[..size]).zip(window.iter()) {
                    *bin = Complex::new(x * w, 0.0);
                }
                fft.forward(frame);
                op(index, &mut frame[..=size / 2]);
                mirror_conjugate(frame);
                fft.inverse(frame);

                for ((acc, bin), &w) in ch.accum.iter_mut().zip(frame.iter()).zip(window.iter()) {
                    *acc += bin.re * w;
                }
                ch.ready.extend(ch.accum[..hop].iter().copied());
                ch.accum.copy_within(hop.., 0);
                ch.accum[size - hop..].fill(0.0);
                ch.pending.drain(..hop);
            }
        }

        let mut out = StereoBuffer::new(frames);
        for (dst, ch) in [&mut out.left, &mut out.right].into_iter().zip(channels.iter_mut()) {
            for sample in dst.iter_mut() {
                *sample = ch.ready.pop_front().unwrap_or(0.0);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: usize, len: usize) -> Vec<f32> {
        (start..start + len)
            .map(|i| ((i as f32) * 0.013).sin() * 0.8)
            .collect()
    }

    #[test]
    fn test_identity_is_pure_delay() {
        let mut stft = SpectralProcessor::new(256);
        let mut input_all = Vec::new();
        let mut output_all = Vec::new();
        let mut pos = 0;
        // Irregular block sizes
        for &len in &[100, 37, 512, 1, 300, 256, 999] {
            let chunk = ramp(pos, len);
            pos += len;
            let out = stft.process(&StereoBuffer::from_mono(&chunk), |_, _| {});
            assert_eq!(out.len(), len);
            input_all.extend_from_slice(&chunk);
            output_all.extend_from_slice(&out.left);
        }
        let latency = stft.latency();
        for n in 0..latency {
            assert!(output_all[n].abs() < 1e-4);
        }
        for n in latency..output_all.len() {
            let expected = input_all[n - latency];
            assert!(
                (output_all[n] - expected).abs() < 1e-3,
                "sample {n}: {} vs {expected}",
                output_all[n]
            );
        }
    }

    #[test]
    fn test_zeroing_bins_silences() {
        let mut stft = SpectralProcessor::new(64);
        let input = StereoBuffer::from_mono(&ramp(0, 640));
        let out = stft.process(&input, |_, bins| bins.fill(Complex::new(0.0, 0.0)));
        assert!(out.peak() < 1e-6);
    }

    #[test]
    fn test_op_called_left_then_right() {
        let mut stft = SpectralProcessor::new(32);
        let mut calls = Vec::new();
        stft.process(&StereoBuffer::new(64), |ch, bins| {
            assert_eq!(bins.len(), 17);
            calls.push(ch);
        });
        assert_eq!(calls, vec![0, 1, 0, 1, 0, 1, 0, 1]);
    }
}
