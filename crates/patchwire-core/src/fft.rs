//! FFT wrapper and analysis windows.
//!
//! [`Fft`] plans a forward/inverse pair once and runs them in place with a
//! preallocated scratch buffer, so per-frame transforms do not allocate. The
//! inverse is normalized by `1/N`, making `inverse(forward(x)) == x`.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Window function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// No tapering.
    Rectangular,
    /// Periodic Hann window.
    Hann,
    /// Periodic sine window, `sin(π(n + ½)/N)`.
    ///
    /// Its square sums to exactly 1 at 50% overlap, so using it for both
    /// analysis and synthesis reconstructs the input perfectly.
    Sine,
}

impl Window {
    /// Multiplies `buffer` by the window in place.
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len() as f32;
        match self {
            Window::Rectangular => {}
            Window::Hann => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample *= 0.5 * (1.0 - (2.0 * PI * i as f32 / n).cos());
                }
            }
            Window::Sine => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample *= (PI * (i as f32 + 0.5) / n).sin();
                }
            }
        }
    }

    /// Returns `size` window coefficients.
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        let mut coeffs = vec![1.0; size];
        self.apply(&mut coeffs);
        coeffs
    }
}

/// In-place forward/inverse FFT of a fixed size.
#[derive(Clone)]
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    ifft: Arc<dyn rustfft::Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    size: usize,
}

impl Fft {
    /// Plans transforms of length `size`.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        Self {
            fft,
            ifft,
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            size,
        }
    }

    /// Transform length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform in place. `buffer.len()` must equal [`size`](Self::size).
    pub fn forward(&mut self, buffer: &mut [Complex<f32>]) {
        self.fft.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Normalized inverse transform in place.
    pub fn inverse(&mut self, buffer: &mut [Complex<f32>]) {
        self.ifft.process_with_scratch(buffer, &mut self.scratch);
        let scale = 1.0 / self.size as f32;
        for c in buffer.iter_mut() {
            *c *= scale;
        }
    }
}

/// Rebuilds the negative-frequency half of a real signal's spectrum from
/// bins `0..=N/2`, so the inverse transform is real.
pub fn mirror_conjugate(buffer: &mut [Complex<f32>]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    buffer[0].im = 0.0;
    buffer[n / 2].im = 0.0;
    for k in 1..n / 2 {
        buffer[n - k] = buffer[k].conj();
    }
}
