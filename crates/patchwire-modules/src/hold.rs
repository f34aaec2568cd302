//! Block replay ("hold") effect.

use std::collections::VecDeque;

use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, StereoBuffer,
};
use tracing::debug;

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Deepest replayable history, in blocks.
pub const MAX_HOLD_BLOCKS: usize = 25;

/// Loops the most recent blocks while held.
///
/// While `hold` is off the input passes through and every block is recorded
/// into a ring of [`MAX_HOLD_BLOCKS`]. Turning `hold` on replays the last
/// `blocks` recorded blocks in order, looping, until it is turned off. With
/// `halt` on the upstream is not pulled during the replay, so it picks up
/// where it stopped; with `halt` off the upstream keeps running and its
/// output is discarded.
///
/// A replayed block is resized to the requested frame count.
///
/// # Parameters
///
/// - `hold`: replay on/off (default off)
/// - `halt`: stop pulling upstream while held (default on)
/// - `blocks`: 1-25 blocks to loop (default 10)
pub struct Hold {
    history: VecDeque<StereoBuffer>,
    /// Blocks frozen when the hold engaged.
    frozen: Vec<StereoBuffer>,
    cursor: usize,
    params: ParamStore,
}

impl Hold {
    /// Replay toggle.
    pub const HOLD: usize = 0;
    /// Halt toggle.
    pub const HALT: usize = 1;
    /// Loop length in blocks.
    pub const BLOCKS: usize = 2;

    /// Creates a pass-through hold.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_HOLD_BLOCKS),
            frozen: Vec::new(),
            cursor: 0,
            params: ParamStore::new(vec![
                ParamDescriptor::toggle("Hold", "hold", false),
                ParamDescriptor::toggle("Halt", "halt", true),
                ParamDescriptor::custom("Blocks", "blocks", 1.0, MAX_HOLD_BLOCKS as f32, 10.0)
                    .with_step(1.0),
            ]),
        }
    }

    /// Whether a replay is running.
    pub fn is_holding(&self) -> bool {
        !self.frozen.is_empty()
    }

    fn engage(&mut self) {
        let count = self.params.get_index(Self::BLOCKS).clamp(1, MAX_HOLD_BLOCKS);
        let skip = self.history.len().saturating_sub(count);
        self.frozen = self.history.iter().skip(skip).cloned().collect();
        self.cursor = 0;
        debug!(blocks = self.frozen.len(), "hold_engaged");
    }

    fn record(&mut self, audio: &StereoBuffer) {
        if self.history.len() == MAX_HOLD_BLOCKS {
            self.history.pop_front();
        }
        self.history.push_back(audio.clone());
    }
}

impl Module for Hold {
    fn kind(&self) -> &'static str {
        "hold"
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
        let holding = self.params.get_bool(Self::HOLD);
        if holding && !self.is_holding() && !self.history.is_empty() {
            self.engage();
        } else if !holding && self.is_holding() {
            self.frozen.clear();
            debug!("hold_released");
        }

        if !self.is_holding() {
            let audio = io.receive_audio(0, frames);
            self.record(&audio);
            return Ok(Block::Audio(audio));
        }

        if !self.params.get_bool(Self::HALT) {
            io.receive_audio(0, frames);
        }
        let mut block = self.frozen[self.cursor].clone();
        block.resize(frames);
        self.cursor = (self.cursor + 1) % self.frozen.len();
        Ok(Block::Audio(block))
    }

    fn reset(&mut self) {
        self.history.clear();
        self.frozen.clear();
        self.cursor = 0;
    }
}
