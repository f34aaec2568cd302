//! Test sources shared by the module tests.

use patchwire_core::{
    Block, Graph, Module, ModuleError, ModuleId, ParamStore, PortId, PortIo, PortSpec,
    StereoBuffer,
};

const AUDIO_OUT: [PortSpec; 1] = [PortSpec::audio("out")];

/// Plays a fixed mono signal once, then silence.
pub struct Signal {
    samples: Vec<f32>,
    pos: usize,
    params: ParamStore,
}

impl Signal {
    pub fn boxed(samples: Vec<f32>) -> Box<dyn Module> {
        Box::new(Self {
            samples,
            pos: 0,
            params: ParamStore::empty(),
        })
    }

    pub fn impulse() -> Box<dyn Module> {
        Self::boxed(vec![1.0])
    }
}

impl Module for Signal {
    fn kind(&self) -> &'static str {
        "signal"
    }
    fn inputs(&self) -> &[PortSpec] {
        &[]
    }
    fn outputs(&self) -> &[PortSpec] {
        &AUDIO_OUT
    }
    fn params(&self) -> &ParamStore {
        &self.params
    }
    fn generate(&mut self, frames: usize, _io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
        let out: Vec<f32> = (0..frames)
            .map(|i| self.samples.get(self.pos + i).copied().unwrap_or(0.0))
            .collect();
        self.pos += frames;
        Ok(Block::Audio(StereoBuffer::from_mono(&out)))
    }
}

/// Feeds `source` into `module` and returns the module id.
pub fn wire(graph: &mut Graph, source: Box<dyn Module>, module: Box<dyn Module>) -> ModuleId {
    let src = graph.add(source);
    let id = graph.add(module);
    graph
        .connect(PortId::output(src, 0), PortId::input(id, 0))
        .unwrap();
    id
}

/// Pulls `total` frames from `id` in blocks of `block` and returns the left channel.
pub fn render(graph: &mut Graph, id: ModuleId, total: usize, block: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(total);
    while out.len() < total {
        let n = block.min(total - out.len());
        out.extend_from_slice(&graph.pull(id, n).into_audio().left);
    }
    out
}
