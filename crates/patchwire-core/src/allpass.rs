//! Schroeder allpass diffuser with a resizable delay.

use crate::delay::DelayLine;
use crate::math::flush_denormal;

/// Allpass filter: `y = -g·x + d`, `write(x + g·y)` where `d` is the delayed sample.
///
/// Flat magnitude response; smears transients in time. Used in series after
/// the comb bank of a reverb.
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    line: DelayLine,
    delay: usize,
    feedback: f32,
}

impl AllpassFilter {
    /// Creates an allpass with `delay_samples` of delay and `g = 0.5`.
    pub fn new(delay_samples: usize) -> Self {
        let delay = delay_samples.max(1);
        Self {
            line: DelayLine::new(delay),
            delay,
            feedback: 0.5,
        }
    }

    /// Sets `g`, clamped to `-0.99..=0.99`.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
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
        let delayed = self.line.read(self.delay);
        let output = -self.feedback * input + delayed;
        self.line.write(flush_denormal(input + self.feedback * output));
        output
    }

    /// Zeroes the buffer.
    pub fn clear(&mut self) {
        self.line.clear();
    }
}
