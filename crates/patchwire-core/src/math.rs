//! DSP math helpers.
//!
//! - [`db_to_linear`] / [`linear_to_db`]: level conversions
//! - [`wet_dry_mix`]: linear dry/wet blend
//! - [`equal_power_pan`]: constant-power stereo placement
//! - [`flush_denormal`]: keeps recursive filters out of denormal range
//! - [`Lcg`]: deterministic noise for modules that need randomness

use libm::{cosf, expf, logf, sinf};

/// Converts decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Converts linear gain to decibels, floored at -200 dB.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// `dry + (wet - dry) * mix`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}

/// Left/right gains for a pan position in `[-1, 1]`.
///
/// `L = cos((p + 1)·π/4)`, `R = sin((p + 1)·π/4)`; both are `√½` at centre.
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * core::f32::consts::FRAC_PI_4;
    (cosf(theta), sinf(theta))
}

/// Flushes values below 1e-20 to zero.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Converts milliseconds to a whole number of samples, at least 1.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> usize {
    ((ms * sample_rate / 1000.0) as usize).max(1)
}

/// Linear-congruential generator (Numerical Recipes constants).
///
/// Deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    /// Creates a generator with `seed`.
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next raw value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.state
    }

    /// Uniform value in `[0, 1)`.
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    /// Uniform value in `[-1, 1)`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_unit() * 2.0 - 1.0
    }

    /// Uniform index in `0..n`; `n` must be non-zero.
    #[inline]
    pub fn next_below(&mut self, n: usize) -> usize {
        ((self.next_unit() * n as f32) as usize).min(n - 1)
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new(0x1234_5678)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_roundtrip() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-6.0) - 0.501).abs() < 0.001);
        assert!((linear_to_db(0.5) + 6.02).abs() < 0.01);
    }

    #[test]
    fn test_pan_centre_and_edges() {
        let (l, r) = equal_power_pan(0.0);
        assert!((l - r).abs() < 1e-6);
        assert!((l * l + r * r - 1.0).abs() < 1e-5);
        let (l, r) = equal_power_pan(-1.0);
        assert!((l - 1.0).abs() < 1e-6 && r.abs() < 1e-6);
    }

    #[test]
    fn test_lcg_deterministic_and_bounded() {
        let mut a = Lcg::new(7);
        let mut b = Lcg::new(7);
        for _ in 0..1000 {
            let x = a.next_unit();
            assert_eq!(x, b.next_unit());
            assert!((0.0..1.0).contains(&x));
            assert!(a.next_below(5) < 5);
            b.next_below(5);
        }
    }

    #[test]
    fn test_ms_to_samples_floor() {
        assert_eq!(ms_to_samples(500.0, 48000.0), 24000);
        assert_eq!(ms_to_samples(0.0, 48000.0), 1);
    }
}
