//! Convolution with a loaded impulse response.
//!
//! The impulse response is transformed by whoever loads it, on the control
//! thread, and published through an [`AssetSlot`]. The audio thread only
//! multiplies spectra. When the loaded kernel changes, the streaming state
//! is rebuilt once on the next block.

use std::sync::Arc;

use patchwire_core::convolution::DEFAULT_HOP;
use patchwire_core::{
    AssetSlot, Block, Convolver, Kernel, Module, ModuleError, ParamDescriptor, ParamStore, PortIo,
    PortSpec, SampleBuffer,
};

use crate::spectral::DryDelay;

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Control-thread side of a [`Convolve`]: loads and clears impulse responses.
#[derive(Clone)]
pub struct ConvolveHandle {
    slot: AssetSlot<Kernel>,
}

impl ConvolveHandle {
    /// Prepares `ir` and publishes it.
    ///
    /// An empty or silent response clears the slot and returns false.
    pub fn load(&self, ir: &[f32]) -> bool {
        match Kernel::prepare(ir, DEFAULT_HOP) {
            Some(kernel) => {
                tracing::debug!(ir_len = ir.len(), fft = kernel.fft_size(), "convolve_load");
                self.slot.store(kernel);
                true
            }
            None => {
                tracing::warn!("rejected silent impulse response");
                self.slot.clear();
                false
            }
        }
    }

    /// Loads the mid signal of a decoded recording.
    pub fn load_sample(&self, sample: &SampleBuffer) -> bool {
        self.load(&sample.mono())
    }

    /// Removes the impulse response; the module bypasses afterwards.
    pub fn clear(&self) {
        self.slot.clear();
    }

    /// Returns true while an impulse response is loaded.
    pub fn is_loaded(&self) -> bool {
        self.slot.is_loaded()
    }
}

struct Active {
    kernel: Arc<Kernel>,
    convolver: Convolver,
    dry: DryDelay,
}

/// Uniform-partition FFT convolution.
///
/// Passes audio through unchanged until an impulse response is loaded.
/// With one loaded, output is delayed by one hop.
///
/// # Parameters
///
/// - `mix`: 0.0-1.0 (default 1.0)
pub struct Convolve {
    slot: AssetSlot<Kernel>,
    active: Option<Active>,
    params: ParamStore,
}

impl Convolve {
    /// Dry/wet mix.
    pub const MIX: usize = 0;

    /// Creates a convolver with no impulse response.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            slot: AssetSlot::new(),
            active: None,
            params: ParamStore::new(vec![ParamDescriptor::mix().with_default(1.0)]),
        }
    }

    /// A loader sharing this module's kernel slot.
    pub fn handle(&self) -> ConvolveHandle {
        ConvolveHandle {
            slot: self.slot.clone(),
        }
    }
}

impl Module for Convolve {
    fn kind(&self) -> &'static str {
        "convolve"
    }

    fn inputs(&self) -> &[PortSpec] {
        &PORTS
    }

    fn outputs(&self) -> &[PortSpec] {
        &PORTS
    }

    fn params(&self) -> &ParamStore {
        &self.params
    }

    fn generate(&mut self, frames: usize, io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
        let input = io.receive_audio(0, frames);
        let Some(kernel) = self.slot.load() else {
            self.active = None;
            return Ok(Block::Audio(input));
        };

        let current = self
            .active
            .as_ref()
            .is_some_and(|a| Arc::ptr_eq(&a.kernel, &kernel));
        if !current {
            self.active = Some(Active {
                convolver: Convolver::new(&kernel),
                dry: DryDelay::new(kernel.hop()),
                kernel,
            });
        }
        let Some(active) = self.active.as_mut() else {
            return Ok(Block::Audio(input));
        };

        let mut wet = active.convolver.process(&input, &active.kernel);
        active.dry.mix_into(&input, &mut wet, self.params.get(Self::MIX));
        Ok(Block::Audio(wet))
    }

    fn reset(&mut self) {
        self.active = None;
    }

    fn latency_samples(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.convolver.latency())
    }
}
