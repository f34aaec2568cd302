//! Fan-out buffer.
//!
//! The graph re-runs a module every time any of its outputs is pulled, so a
//! stateful source feeding two consumers advances twice per block. [`Split`]
//! pulls its input once every `n` calls, where `n` is the number of its
//! outputs currently connected, and hands a copy of that block to every
//! caller in between.

use patchwire_core::{Block, Module, ModuleError, ParamStore, PortIo, PortSpec};

const INPUTS: [PortSpec; 1] = [PortSpec::audio("in")];
const OUTPUTS: [PortSpec; 2] = [PortSpec::audio("out 1"), PortSpec::audio("out 2")];

/// One audio input copied to two outputs, pulling upstream once per block.
///
/// Every consumer must pull once per logical block. A consumer that pulls
/// more often shifts the refresh phase for all of them.
pub struct Split {
    buffer: Option<Block>,
    count: usize,
    params: ParamStore,
}

impl Split {
    /// Creates a split with an empty cache.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            buffer: None,
            count: 0,
            params: ParamStore::empty(),
        }
    }

    /// Calls served since the last refresh.
    pub fn calls_since_refresh(&self) -> usize {
        self.count
    }
}

impl Module for Split {
    fn kind(&self) -> &'static str {
        "split"
    }

    fn inputs(&self) -> &[PortSpec] {
        &INPUTS
    }

    fn outputs(&self) -> &[PortSpec] {
        &OUTPUTS
    }

    fn params(&self) -> &ParamStore {
        &self.params
    }

    fn generate(&mut self, frames: usize, io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
        let n = io.connected_outputs().max(1);
        let stale = match &self.buffer {
            None => true,
            Some(block) => block.frames() != frames || self.count % n == 0,
        };
        if stale {
            self.buffer = Some(io.receive(0, frames));
            self.count = 0;
        }
        self.count += 1;
        Ok(match &self.buffer {
            Some(block) => block.clone(),
            None => Block::silence(patchwire_core::DataType::Audio, frames),
        })
    }

    fn reset(&mut self) {
        self.buffer = None;
        self.count = 0;
    }
}
