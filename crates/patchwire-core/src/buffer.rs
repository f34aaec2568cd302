//! Stereo sample storage shared by audio blocks and sample assets.

/// A stereo audio buffer with separate left and right channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoBuffer {
    /// Left channel samples.
    pub left: Vec<f32>,
    /// Right channel samples.
    pub right: Vec<f32>,
}

impl StereoBuffer {
    /// Creates a new zeroed stereo buffer with the given length.
    pub fn new(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Builds a buffer from two channels, truncating the longer one.
    pub fn from_channels(mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let frames = left.len().min(right.len());
        left.truncate(frames);
        right.truncate(frames);
        Self { left, right }
    }

    /// Builds a buffer with the same signal in both channels.
    pub fn from_mono(samples: &[f32]) -> Self {
        Self {
            left: samples.to_vec(),
            right: samples.to_vec(),
        }
    }

    /// Fills both channels with zeros.
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    /// Resizes both channels, zeroing new samples.
    pub fn resize(&mut self, frames: usize) {
        self.left.resize(frames, 0.0);
        self.right.resize(frames, 0.0);
    }

    /// Returns the number of frames.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Returns true if the buffer has zero length.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Returns the `(left, right)` pair at `frame`.
    #[inline]
    pub fn frame(&self, frame: usize) -> (f32, f32) {
        (self.left[frame], self.right[frame])
    }

    /// Returns the mid signal `(l + r) / 2` at `frame`.
    #[inline]
    pub fn mid(&self, frame: usize) -> f32 {
        (self.left[frame] + self.right[frame]) * 0.5
    }

    /// Copies contents from another buffer of the same length.
    pub fn copy_from(&mut self, other: &StereoBuffer) {
        self.left.copy_from_slice(&other.left);
        self.right.copy_from_slice(&other.right);
    }

    /// Adds another buffer's contents sample-by-sample.
    pub fn accumulate_from(&mut self, other: &StereoBuffer) {
        for (dst, src) in self.left.iter_mut().zip(other.left.iter()) {
            *dst += *src;
        }
        for (dst, src) in self.right.iter_mut().zip(other.right.iter()) {
            *dst += *src;
        }
    }

    /// Adds `other * gain` sample-by-sample.
    pub fn accumulate_scaled(&mut self, other: &StereoBuffer, gain: f32) {
        for (dst, src) in self.left.iter_mut().zip(other.left.iter()) {
            *dst += *src * gain;
        }
        for (dst, src) in self.right.iter_mut().zip(other.right.iter()) {
            *dst += *src * gain;
        }
    }

    /// Multiplies every sample by `gain`.
    pub fn scale(&mut self, gain: f32) {
        for s in self.left.iter_mut().chain(self.right.iter_mut()) {
            *s *= gain;
        }
    }

    /// Clamps every sample to `[-limit, limit]`.
    pub fn clip(&mut self, limit: f32) {
        for s in self.left.iter_mut().chain(self.right.iter_mut()) {
            *s = s.clamp(-limit, limit);
        }
    }

    /// Largest absolute sample value across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}
