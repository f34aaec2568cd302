//! Zipper-free gain changes.
//!
//! Parameters arrive from the control thread as raw steps. Modules that
//! apply them as per-sample gains run the value through a [`SmoothedParam`]
//! so a jump becomes a short exponential glide.

use libm::expf;

/// One-pole smoothed value: `y[n] = y[n-1] + c·(target - y[n-1])`.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
    sample_rate: f32,
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Creates a smoother at `initial` with time constant `smoothing_time_ms`.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate,
            smoothing_time_ms,
        };
        param.recalculate_coeff();
        param
    }

    /// A 5 ms smoother, suitable for gains.
    pub fn fast(initial: f32, sample_rate: f32) -> Self {
        Self::with_config(initial, sample_rate, 5.0)
    }

    /// Sets the value to glide toward.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jumps straight to `value`.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Updates the sample rate, keeping the time constant.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Advances one sample and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Jumps to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glides_toward_target() {
        let mut p = SmoothedParam::fast(0.0, 48000.0);
        p.set_target(1.0);
        let first = p.advance();
        assert!(first > 0.0 && first < 0.1);
        for _ in 0..4800 {
            p.advance();
        }
        assert!((p.get() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_time_is_instant() {
        let mut p = SmoothedParam::with_config(0.0, 48000.0, 0.0);
        p.set_target(0.5);
        assert_eq!(p.advance(), 0.5);
    }
}
