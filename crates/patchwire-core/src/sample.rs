//! Loaded sample data and lock-free hand-off to the audio thread.
//!
//! Large assets (decoded tracks, impulse responses) are built off the audio
//! thread and published through an [`AssetSlot`]: a shared
//! [`ArcSwapOption`] whose store is a single pointer swap. The audio thread
//! loads once per block and keeps that `Arc` for the whole block, so a swap
//! in the middle of a block can never leave it reading half of each asset.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::buffer::StereoBuffer;

/// A decoded stereo recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Sample frames.
    pub audio: StereoBuffer,
    /// Rate the samples were recorded at.
    pub sample_rate: f32,
}

impl SampleBuffer {
    /// Wraps stereo audio.
    pub fn new(audio: StereoBuffer, sample_rate: f32) -> Self {
        Self { audio, sample_rate }
    }

    /// Builds a buffer with `samples` in both channels.
    pub fn from_mono(samples: &[f32], sample_rate: f32) -> Self {
        Self::new(StereoBuffer::from_mono(samples), sample_rate)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.audio.len()
    }

    /// Returns true when the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.len() as f32 / self.sample_rate
    }

    /// Mid (`(l + r) / 2`) signal.
    pub fn mono(&self) -> Vec<f32> {
        (0..self.len()).map(|i| self.audio.mid(i)).collect()
    }
}

/// Shared, swappable slot holding an optional asset.
pub struct AssetSlot<T> {
    inner: Arc<ArcSwapOption<T>>,
}

impl<T> AssetSlot<T> {
    /// An empty slot.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Publishes a new asset, replacing the previous one.
    pub fn store(&self, asset: T) {
        self.inner.store(Some(Arc::new(asset)));
    }

    /// Publishes an already shared asset.
    pub fn store_arc(&self, asset: Arc<T>) {
        self.inner.store(Some(asset));
    }

    /// Empties the slot.
    pub fn clear(&self) {
        self.inner.store(None);
    }

    /// The current asset, if any.
    pub fn load(&self) -> Option<Arc<T>> {
        self.inner.load_full()
    }

    /// Returns true if an asset is loaded.
    pub fn is_loaded(&self) -> bool {
        self.inner.load().is_some()
    }
}

impl<T> Clone for AssetSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for AssetSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Slot for decoded sample data.
pub type SampleSlot = AssetSlot<SampleBuffer>;
