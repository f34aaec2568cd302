//! Feedback comb filter with a damped, resizable delay.

use crate::delay::DelayLine;
use crate::math::flush_denormal;

/// Comb filter with feedback and one-pole damping in the feedback path.
///
/// The delay length can be changed at any time with
/// [`set_delay`](Self::set_delay). Lengths beyond the current capacity grow
/// the underlying [`DelayLine`] without discarding buffered samples.
///
/// # Example
///
/// ```rust
/// use patchwire_core::CombFilter;
///
/// let mut comb = CombFilter::new(1000);
/// comb.set_feedback(0.4);
/// comb.set_delay(1500);
/// assert!(comb.capacity() >= 1500);
/// let _ = comb.process(1.0);
/// ```
#[derive(Debug, Clone)]
pub struct CombFilter {
    line: DelayLine,
    delay: usize,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filterstore: f32,
}

impl CombFilter {
    /// Creates a comb with `delay_samples` of delay (at least 1).
    pub fn new(delay_samples: usize) -> Self {
        let delay = delay_samples.max(1);
        Self {
            line: DelayLine::new(delay),
            delay,
            feedback: 0.5,
            damp1: 0.0,
            damp2: 1.0,
            filterstore: 0.0,
        }
    }

    /// Sets the feedback amount, clamped to `0.0..=0.99`.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    /// Sets high-frequency damping, `0.0` (bright) to `1.0` (dark).
    #[inline]
    pub fn set_damp(&mut self, damp: f32) {
        self.damp1 = damp.clamp(0.0, 0.99);
        self.damp2 = 1.0 - self.damp1;
    }

    /// Sets the delay length in samples, growing the buffer if needed.
    pub fn set_delay(&mut self, delay_samples: usize) {
        let delay = delay_samples.max(1);
        if delay > self.line.capacity() {
            self.line.grow(delay);
        }
        self.delay = delay;
    }

    /// Current delay length in samples.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Current buffer capacity in samples.
    pub fn capacity(&self) -> usize {
        self.line.capacity()
    }

    /// The delay line, for inspection.
    pub fn line(&self) -> &DelayLine {
        &self.line
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.line.read(self.delay);
        self.filterstore = flush_denormal(output * self.damp2 + self.filterstore * self.damp1);
        self.line.write(flush_denormal(input + self.filterstore * self.feedback));
        output
    }

    /// Zeroes the buffer and filter state.
    pub fn clear(&mut self) {
        self.line.clear();
        self.filterstore = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comb_impulse_echoes() {
        let mut comb = CombFilter::new(10);
        comb.set_feedback(0.5);
        let out: Vec<f32> = (0..31)
            .map(|i| comb.process(if i == 0 { 1.0 } else { 0.0 }))
            .collect();
        assert_eq!(out[0], 0.0);
        assert!((out[10] - 1.0).abs() < 1e-6);
        assert!((out[20] - 0.5).abs() < 1e-6);
        assert!((out[30] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_comb_feedback_decay() {
        let mut comb = CombFilter::new(50);
        comb.set_feedback(0.7);
        comb.set_damp(0.2);
        comb.process(1.0);
        let mut energy = 0.0;
        for _ in 0..5000 {
            energy += comb.process(0.0).abs();
        }
        let tail: f32 = (0..100).map(|_| comb.process(0.0).abs()).sum();
        assert!(energy > 1.0);
        assert!(tail < 1e-3);
    }

    #[test]
    fn test_comb_grow_keeps_tail() {
        let mut comb = CombFilter::new(20);
        for i in 0..40 {
            comb.process((i as f32 * 0.3).sin());
        }
        let before = comb.line().recent(20);
        comb.set_delay(35);
        assert_eq!(comb.capacity(), 35);
        assert_eq!(comb.line().recent(20), before);
        comb.set_delay(10);
        assert_eq!(comb.capacity(), 35);
        assert_eq!(comb.delay(), 10);
    }
}
