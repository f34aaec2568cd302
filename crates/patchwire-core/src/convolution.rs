//! Uniform overlap-add FFT convolution.
//!
//! A [`Kernel`] is an impulse response already transformed to the frequency
//! domain, along with its FFT plans. Preparing one is the expensive step and
//! belongs on a control or worker thread (see [`AssetSlot`](crate::AssetSlot)).
//! A [`Convolver`] then streams audio through it one hop at a time.
//!
//! Each hop of `B` input samples is zero-padded to `N ≥ B + L - 1`, multiplied
//! by the kernel spectrum and inverse-transformed. The `N`-sample result is
//! added into an accumulator. The first `B` samples are final and released;
//! the rest is the tail carried into the next hop. The latency is one hop.

use std::collections::VecDeque;

use rustfft::num_complex::Complex;

use crate::buffer::StereoBuffer;
use crate::fft::Fft;

/// Default hop for [`Kernel::prepare`].
pub const DEFAULT_HOP: usize = 512;

/// A frequency-domain impulse response.
pub struct Kernel {
    spectrum: Vec<Complex<f32>>,
    fft: Fft,
    hop: usize,
    ir_len: usize,
}

impl Kernel {
    /// Transforms `ir` for convolution in hops of `hop` samples.
    ///
    /// Returns `None` for an empty or all-zero response.
    pub fn prepare(ir: &[f32], hop: usize) -> Option<Self> {
        if ir.iter().all(|&x| x == 0.0) {
            return None;
        }
        let hop = hop.max(1);
        let size = (hop + ir.len() - 1).next_power_of_two();
        let mut fft = Fft::new(size);
        let mut spectrum: Vec<Complex<f32>> = ir.iter().map(|&x| Complex::new(x, 0.0)).collect();
        spectrum.resize(size, Complex::new(0.0, 0.0));
        fft.forward(&mut spectrum);
        Some(Self {
            spectrum,
            fft,
            hop,
            ir_len: ir.len(),
        })
    }

    /// FFT size.
    pub fn fft_size(&self) -> usize {
        self.spectrum.len()
    }

    /// Input hop in samples.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Impulse response length in samples.
    pub fn ir_len(&self) -> usize {
        self.ir_len
    }
}

struct ChannelState {
    pending: Vec<f32>,
    accum: Vec<f32>,
    ready: VecDeque<f32>,
}

/// Streaming stereo convolver bound to one [`Kernel`].
pub struct Convolver {
    fft: Fft,
    frame: Vec<Complex<f32>>,
    channels: [ChannelState; 2],
    hop: usize,
}

impl Convolver {
    /// Allocates streaming state for `kernel`.
    pub fn new(kernel: &Kernel) -> Self {
        let size = kernel.fft_size();
        let hop = kernel.hop;
        let channel = || ChannelState {
            pending: Vec::with_capacity(hop * 2),
            accum: vec![0.0; size],
            ready: core::iter::repeat_n(0.0, hop).collect(),
        };
        Self {
            fft: kernel.fft.clone(),
            frame: vec![Complex::new(0.0, 0.0); size],
            channels: [channel(), channel()],
            hop,
        }
    }

    /// Delay between input and output in samples.
    pub fn latency(&self) -> usize {
        self.hop
    }

    /// Convolves one block with `kernel` and returns a block of the same length.
    ///
    /// `kernel` must be the one this convolver was created for.
    pub fn process(&mut self, input: &StereoBuffer, kernel: &Kernel) -> StereoBuffer {
        let Self {
            fft,
            frame,
            channels,
            hop,
        } = self;
        let hop = *hop;
        let size = frame.len();

        for (ch, samples) in channels.iter_mut().zip([&input.left, &input.right]) {
            ch.pending.extend_from_slice(samples);
            while ch.pending.len() >= hop {
                for (i, bin) in frame.iter_mut().enumerate() {
                    let x = if i < hop { ch.pending[i] } else { 0.0 };
                    *bin = Complex::new(x, 0.0);
                }
                fft.forward(frame);
                for (bin, h) in frame.iter_mut().zip(&kernel.spectrum) {
                    *bin *= *h;
                }
                fft.inverse(frame);
                for (acc, bin) in ch.accum.iter_mut().zip(frame.iter()) {
                    *acc += bin.re;
                }
                ch.ready.extend(ch.accum[..hop].iter().copied());
                ch.accum.copy_within(hop.., 0);
                ch.accum[size - hop..].fill(0.0);
                ch.pending.drain(..hop);
            }
        }

        let mut out = StereoBuffer::new(input.len());
        for (dst, ch) in [&mut out.left, &mut out.right].into_iter().zip(channels.iter_mut()) {
            for sample in dst.iter_mut() {
                *sample = ch.ready.pop_front().unwrap_or(0.0);
            }
        }
        out
    }
}
