//! The module contract.
//!
//! A [`Module`] owns a fixed port schema, a [`ParamStore`] and private DSP
//! state. When the graph asks it for N frames it pulls whatever it needs from
//! its inputs through [`PortIo`] and returns exactly one [`Block`] of N frames.
//!
//! # Real-time rules
//!
//! `generate` runs on the audio thread. Implementations must not block,
//! must not do file or network I/O, and must keep allocation bounded by the
//! block size. Long work goes to a [`BackgroundJob`](crate::BackgroundJob)
//! and large assets arrive through an [`AssetSlot`](crate::AssetSlot).
//!
//! # Block sizes
//!
//! The frame count may change between calls. Modules with internal windows
//! (FFT processors, delay lines) buffer across calls and must return exactly
//! the requested count every time.

use core::any::Any;

use crate::block::Block;
use crate::error::ModuleError;
use crate::graph::PortIo;
use crate::param::ParamStore;
use crate::port::PortSpec;

/// A module's persisted state: a flat JSON object.
///
/// This is the numeric state a module needs to restore itself. Loaded
/// assets (sample data, impulse responses) are never included.
pub type ModuleState = serde_json::Map<String, serde_json::Value>;

/// Upcast helper so graphs can hand out concrete module types.
pub trait AsAny: Any {
    /// `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of audio computation with fixed ports.
///
/// # Example
///
/// ```rust
/// use patchwire_core::{Block, Module, ModuleError, ParamStore, PortIo, PortSpec};
///
/// struct Invert {
///     params: ParamStore,
/// }
///
/// const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];
///
/// impl Module for Invert {
///     fn kind(&self) -> &'static str { "invert" }
///     fn inputs(&self) -> &[PortSpec] { &PORTS }
///     fn outputs(&self) -> &[PortSpec] { &PORTS }
///     fn params(&self) -> &ParamStore { &self.params }
///
///     fn generate(&mut self, frames: usize, io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
///         let mut audio = io.receive_audio(0, frames);
///         audio.scale(-1.0);
///         Ok(Block::Audio(audio))
///     }
/// }
/// ```
pub trait Module: AsAny + Send {
    /// Registry kind id, e.g. `"reverb"`.
    fn kind(&self) -> &'static str;

    /// Input port schema. Must not change after construction.
    fn inputs(&self) -> &[PortSpec];

    /// Output port schema. Must not change after construction.
    fn outputs(&self) -> &[PortSpec];

    /// The module's parameters.
    fn params(&self) -> &ParamStore;

    /// Produces `frames` frames for the module's primary output.
    ///
    /// Sinks (modules without outputs) return their final audio here.
    fn generate(&mut self, frames: usize, io: &mut PortIo<'_>) -> Result<Block, ModuleError>;

    /// Produces `frames` frames for output `output`.
    ///
    /// Modules whose outputs carry different data override this; the default
    /// runs [`generate`](Self::generate) for every output.
    fn generate_port(
        &mut self,
        output: usize,
        frames: usize,
        io: &mut PortIo<'_>,
    ) -> Result<Block, ModuleError> {
        let _ = output;
        self.generate(frames, io)
    }

    /// Called when the module joins a graph and whenever the rate changes.
    fn set_sample_rate(&mut self, sample_rate: f32) {
        let _ = sample_rate;
    }

    /// Clears DSP state (delay lines, envelopes, playheads).
    fn reset(&mut self) {}

    /// Fixed processing delay in frames.
    fn latency_samples(&self) -> usize {
        0
    }

    /// Captures the module's own numeric state.
    fn serialize(&self) -> ModuleState {
        self.params().snapshot()
    }

    /// Restores state captured by [`serialize`](Self::serialize).
    fn deserialize(&mut self, state: &ModuleState) -> Result<(), ModuleError> {
        self.params().restore(state)
    }
}
