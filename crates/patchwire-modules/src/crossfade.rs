//! Two-input linear crossfader.

use patchwire_core::{Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec};

const INPUTS: [PortSpec; 2] = [PortSpec::audio("a"), PortSpec::audio("b")];
const OUTPUTS: [PortSpec; 1] = [PortSpec::audio("out")];

/// `A·(1 - m) + B·m`.
pub struct Crossfade {
    params: ParamStore,
}

impl Crossfade {
    /// Position, 0 (all A) to 1 (all B).
    pub const MIX: usize = 0;

    /// Creates a crossfader at the midpoint.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            params: ParamStore::new(vec![ParamDescriptor::custom(
                "Crossfade", "mix", 0.0, 1.0, 0.5,
            )]),
        }
    }
}

impl Module for Crossfade {
    fn kind(&self) -> &'static str {
        "crossfade"
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
        let m = self.params.get(Self::MIX);
        let mut out = io.receive_audio(0, frames);
        let b = io.receive_audio(1, frames);
        out.scale(1.0 - m);
        out.accumulate_scaled(&b, m);
        Ok(Block::Audio(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Signal;
    use patchwire_core::{Graph, PortId};

    #[test]
    fn test_blend() {
        let mut graph = Graph::new(48000.0);
        let a = graph.add(Signal::boxed(vec![1.0; 64]));
        let b = graph.add(Signal::boxed(vec![-1.0; 64]));
        let x = graph.add(Box::new(Crossfade::new(48000.0)));
        graph.connect(PortId::output(a, 0), PortId::input(x, 0)).unwrap();
        graph.connect(PortId::output(b, 0), PortId::input(x, 1)).unwrap();

        assert!(graph.pull(x, 4).into_audio().left[0].abs() < 1e-6);
        graph.params(x).unwrap().set(Crossfade::MIX, 0.25);
        assert!((graph.pull(x, 4).into_audio().left[0] - 0.5).abs() < 1e-6);
    }
}
