//! A module's view of its own ports while it generates.

use crate::block::{Block, CueTrigger, EventBlock};
use crate::buffer::StereoBuffer;
use crate::port::PortId;

use super::node::ModuleId;
use super::processing::Graph;

/// Port access handed to [`Module::generate`](crate::Module::generate).
///
/// Receiving on an input recursively evaluates whatever is connected to it.
/// Index arguments are positions in the module's own input/output lists.
pub struct PortIo<'g> {
    graph: &'g mut Graph,
    module: ModuleId,
}

impl<'g> PortIo<'g> {
    pub(crate) fn new(graph: &'g mut Graph, module: ModuleId) -> Self {
        Self { graph, module }
    }

    /// Id of the module being evaluated.
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    /// Sample rate of the graph.
    pub fn sample_rate(&self) -> f32 {
        self.graph.sample_rate()
    }

    /// Pulls `frames` frames from input `input`, as that input's data type.
    pub fn receive(&mut self, input: usize, frames: usize) -> Block {
        self.graph.receive(PortId::input(self.module, input), frames)
    }

    /// Pulls `frames` frames from input `input` as stereo audio.
    pub fn receive_audio(&mut self, input: usize, frames: usize) -> StereoBuffer {
        self.receive(input, frames).into_audio()
    }

    /// Pulls `frames` frames from input `input` as control values.
    pub fn receive_control(&mut self, input: usize, frames: usize) -> Vec<f32> {
        self.receive(input, frames).into_control()
    }

    /// Pulls `frames` frames from input `input` as cue triggers.
    pub fn receive_cues(&mut self, input: usize, frames: usize) -> EventBlock<CueTrigger> {
        self.receive(input, frames).into_cues()
    }

    /// Returns true if input `input` is connected.
    pub fn is_input_connected(&self, input: usize) -> bool {
        self.graph.is_connected(PortId::input(self.module, input))
    }

    /// Returns true if output `output` is connected.
    pub fn is_output_connected(&self, output: usize) -> bool {
        self.graph.is_connected(PortId::output(self.module, output))
    }

    /// Number of this module's outputs that are connected.
    pub fn connected_outputs(&self) -> usize {
        self.graph.connected_outputs(self.module)
    }

    /// The upstream output feeding input `input`, if connected.
    pub fn sender_of(&self, input: usize) -> Option<PortId> {
        self.graph.peer(PortId::input(self.module, input))
    }

    /// Registry kind of the module feeding input `input`, if connected.
    pub fn sender_kind(&self, input: usize) -> Option<&'static str> {
        self.sender_of(input).and_then(|p| self.graph.kind(p.module))
    }
}
