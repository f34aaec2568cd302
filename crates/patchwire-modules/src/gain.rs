//! Gain stage.

use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, SmoothedParam,
    db_to_linear,
};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Smoothed linear gain, -60 to +12 dB.
///
/// At its 0 dB default this is a transparent passthrough, which makes it the
/// usual module to splice into a live connection.
pub struct Gain {
    gain: SmoothedParam,
    params: ParamStore,
}

impl Gain {
    /// Gain in dB.
    pub const GAIN: usize = 0;

    /// Creates a unity gain stage.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            gain: SmoothedParam::fast(1.0, sample_rate),
            params: ParamStore::new(vec![ParamDescriptor::gain_db(
                "Gain", "gain_db", -60.0, 12.0, 0.0,
            )]),
        }
    }
}

impl Module for Gain {
    fn kind(&self) -> &'static str {
        "gain"
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
        let mut audio = io.receive_audio(0, frames);
        self.gain.set_target(db_to_linear(self.params.get(Self::GAIN)));
        for i in 0..frames {
            let g = self.gain.advance();
            audio.left[i] *= g;
            audio.right[i] *= g;
        }
        Ok(Block::Audio(audio))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.gain.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.gain.snap_to_target();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Signal, render, wire};
    use patchwire_core::Graph;

    #[test]
    fn test_unity_is_transparent() {
        let mut graph = Graph::new(48000.0);
        let input: Vec<f32> = (0..300).map(|i| (i as f32 * 0.1).sin()).collect();
        let id = wire(&mut graph, Signal::boxed(input.clone()), Box::new(Gain::new(48000.0)));
        let out = render(&mut graph, id, 300, 64);
        for (a, b) in out.iter().zip(&input) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cut_converges() {
        let mut graph = Graph::new(48000.0);
        let id = wire(&mut graph, Signal::boxed(vec![1.0; 9600]), Box::new(Gain::new(48000.0)));
        graph.params(id).unwrap().set(Gain::GAIN, -6.0);
        let out = render(&mut graph, id, 9600, 512);
        assert!((out[9599] - db_to_linear(-6.0)).abs() < 1e-3);
        assert!(out[0] > 0.99);
    }
}
