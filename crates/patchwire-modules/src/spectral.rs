//! Pieces shared by the STFT modules.

use patchwire_core::{DelayLine, StereoBuffer, wet_dry_mix};
use rustfft::num_complex::Complex;

/// Magnitude remapping that keeps every bin's own phase.
pub(crate) struct MagnitudeWarp {
    mags: Vec<f32>,
}

impl MagnitudeWarp {
    pub(crate) fn new(bins: usize) -> Self {
        Self {
            mags: vec![0.0; bins],
        }
    }

    fn capture(&mut self, bins: &[Complex<f32>]) {
        self.mags.resize(bins.len(), 0.0);
        for (m, bin) in self.mags.iter_mut().zip(bins) {
            *m = bin.norm();
        }
    }

    /// Bin `i` takes the magnitude of bin `floor(i / ratio)`, or zero past the top.
    pub(crate) fn nearest(&mut self, bins: &mut [Complex<f32>], ratio: f32) {
        self.capture(bins);
        let n = bins.len();
        for (i, bin) in bins.iter_mut().enumerate() {
            let src = (i as f32 / ratio) as usize;
            let mag = if src < n { self.mags[src] } else { 0.0 };
            *bin = Complex::from_polar(mag, bin.arg());
        }
    }

    /// Bin `i` takes the magnitude linearly interpolated at `i / ratio`.
    pub(crate) fn interpolated(&mut self, bins: &mut [Complex<f32>], ratio: f32) {
        self.capture(bins);
        let n = bins.len();
        for (i, bin) in bins.iter_mut().enumerate() {
            let pos = i as f32 / ratio;
            let lo = pos as usize;
            let mag = if lo + 1 < n {
                let frac = pos - lo as f32;
                self.mags[lo] * (1.0 - frac) + self.mags[lo + 1] * frac
            } else if lo < n {
                self.mags[lo]
            } else {
                0.0
            };
            *bin = Complex::from_polar(mag, bin.arg());
        }
    }
}

/// Delays the dry path by the processor latency so the mix lines up.
pub(crate) struct DryDelay {
    lines: [DelayLine; 2],
    latency: usize,
}

impl DryDelay {
    pub(crate) fn new(latency: usize) -> Self {
        Self {
            lines: [DelayLine::new(latency), DelayLine::new(latency)],
            latency,
        }
    }

    /// Blends `wet` into `dry` delayed by the latency, in place on `wet`.
    pub(crate) fn mix_into(&mut self, dry: &StereoBuffer, wet: &mut StereoBuffer, mix: f32) {
        let [dl, dr] = &mut self.lines;
        for i in 0..dry.len() {
            let (xl, xr) = dry.frame(i);
            let delayed_l = dl.read(self.latency);
            let delayed_r = dr.read(self.latency);
            dl.write(xl);
            dr.write(xr);
            wet.left[i] = wet_dry_mix(delayed_l, wet.left[i], mix);
            wet.right[i] = wet_dry_mix(delayed_r, wet.right[i], mix);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.lines.iter_mut().for_each(DelayLine::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bins(mags: &[f32]) -> Vec<Complex<f32>> {
        mags.iter()
            .enumerate()
            .map(|(i, &m)| Complex::from_polar(m, i as f32 * 0.3))
            .collect()
    }

    #[test]
    fn test_nearest_shift_up_keeps_phase() {
        let mut warp = MagnitudeWarp::new(8);
        let mut b = bins(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        warp.nearest(&mut b, 2.0);
        let mags: Vec<f32> = b.iter().map(|c| (c.norm() * 1000.0).round() / 1000.0).collect();
        assert_eq!(mags, vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
        assert!((b[3].arg() - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_nearest_shift_down_zeroes_top() {
        let mut warp = MagnitudeWarp::new(4);
        let mut b = bins(&[1.0, 2.0, 3.0, 4.0]);
        warp.nearest(&mut b, 0.5);
        assert!((b[1].norm() - 3.0).abs() < 1e-4);
        assert!(b[2].norm() < 1e-6);
        assert!(b[3].norm() < 1e-6);
    }

    #[test]
    fn test_interpolated_midpoints() {
        let mut warp = MagnitudeWarp::new(4);
        let mut b = bins(&[0.0, 2.0, 4.0, 6.0]);
        warp.interpolated(&mut b, 2.0);
        assert!((b[1].norm() - 1.0).abs() < 1e-4);
        assert!((b[3].norm() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_dry_delay_aligns() {
        let mut dry = DryDelay::new(3);
        let input = StereoBuffer::from_mono(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut wet = StereoBuffer::new(5);
        dry.mix_into(&input, &mut wet, 0.0);
        assert_eq!(wet.left, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }
}
