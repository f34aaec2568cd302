//! Equal-power panner.

use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, StereoBuffer,
    equal_power_pan,
};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Places the mono mid of its input in the stereo field.
///
/// `L = mid·cos((p+1)·π/4)`, `R = mid·sin((p+1)·π/4)` for pan `p` in -1..1.
pub struct Pan {
    params: ParamStore,
}

impl Pan {
    /// Pan position, -1 (left) to 1 (right).
    pub const PAN: usize = 0;

    /// Creates a centred panner.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            params: ParamStore::new(vec![ParamDescriptor::custom("Pan", "pan", -1.0, 1.0, 0.0)]),
        }
    }
}

impl Module for Pan {
    fn kind(&self) -> &'static str {
        "pan"
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
        let (gl, gr) = equal_power_pan(self.params.get(Self::PAN));
        let mut out = StereoBuffer::new(frames);
        for i in 0..frames {
            let mid = input.mid(i);
            out.left[i] = mid * gl;
            out.right[i] = mid * gr;
        }
        Ok(Block::Audio(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Signal, wire};
    use patchwire_core::Graph;

    #[test]
    fn test_hard_left_and_centre() {
        let mut graph = Graph::new(48000.0);
        let id = wire(&mut graph, Signal::boxed(vec![1.0; 64]), Box::new(Pan::new(48000.0)));
        let params = graph.params(id).unwrap();

        let centre = graph.pull(id, 4).into_audio();
        assert!((centre.left[0] - core::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
        assert!((centre.left[0] - centre.right[0]).abs() < 1e-6);

        params.set(Pan::PAN, -1.0);
        let left = graph.pull(id, 4).into_audio();
        assert!((left.left[0] - 1.0).abs() < 1e-5);
        assert!(left.right[0].abs() < 1e-5);
    }
}
