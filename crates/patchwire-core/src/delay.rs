//! Growable circular delay line.
//!
//! [`DelayLine`] is the storage behind the comb and allpass filters and the
//! delay effects. Unlike a fixed ring buffer it can be enlarged while
//! running: [`grow`](DelayLine::grow) re-linearizes the ring and pads it with
//! silence *older* than anything written, so every buffered sample keeps its
//! age and a longer read tap starts on silence instead of a discontinuity.

/// A circular buffer of past samples.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Creates a zeroed line holding `capacity` samples (at least 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    /// Number of samples the line can hold.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The sample written `delay` samples ago, with `delay` clamped to `1..=capacity`.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(1, len);
        self.buffer[(self.write_pos + len - delay) % len]
    }

    /// Appends a sample, overwriting the oldest.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Enlarges the line to `capacity`, keeping every buffered sample at its age.
    ///
    /// Does nothing if the line is already at least that large.
    pub fn grow(&mut self, capacity: usize) {
        let len = self.buffer.len();
        if capacity <= len {
            return;
        }
        // Oldest sample first, then pad with silence in front of it.
        self.buffer.rotate_left(self.write_pos);
        self.buffer
            .splice(0..0, core::iter::repeat_n(0.0, capacity - len));
        self.write_pos = 0;
    }

    /// The `count` most recent samples, newest first.
    pub fn recent(&self, count: usize) -> Vec<f32> {
        (1..=count.min(self.buffer.len()))
            .map(|d| self.read(d))
            .collect()
    }

    /// Zeroes the line.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_after_write() {
        let mut line = DelayLine::new(4);
        for x in [1.0, 2.0, 3.0] {
            line.write(x);
        }
        assert_eq!(line.read(1), 3.0);
        assert_eq!(line.read(3), 1.0);
        assert_eq!(line.read(4), 0.0);
        assert_eq!(line.read(0), 3.0);
    }

    #[test]
    fn test_grow_preserves_history() {
        let mut line = DelayLine::new(5);
        for i in 0..13 {
            line.write(i as f32);
        }
        let before = line.recent(5);
        line.grow(9);
        assert_eq!(line.capacity(), 9);
        assert_eq!(line.recent(5), before);
        assert_eq!(line.read(9), 0.0);

        line.write(100.0);
        assert_eq!(line.read(1), 100.0);
        assert_eq!(line.read(2), 12.0);
    }

    #[test]
    fn test_grow_never_shrinks() {
        let mut line = DelayLine::new(8);
        line.grow(4);
        assert_eq!(line.capacity(), 8);
    }
}
