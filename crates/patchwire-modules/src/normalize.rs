//! Per-block peak normalization.

use patchwire_core::{Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Peaks below this are left alone.
const SILENCE: f32 = 1e-6;

/// Scales every block so its peak equals the target.
///
/// # Parameters
///
/// - `target`: 0.0-1.0 peak level (default 1.0)
pub struct Normalize {
    params: ParamStore,
}

impl Normalize {
    /// Target peak.
    pub const TARGET: usize = 0;

    /// Creates a normalizer targeting full scale.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            params: ParamStore::new(vec![ParamDescriptor::custom(
                "Target Peak",
                "target",
                0.0,
                1.0,
                1.0,
            )
            .with_short_name("Target")]),
        }
    }
}

impl Module for Normalize {
    fn kind(&self) -> &'static str {
        "normalize"
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
        let peak = audio.peak();
        if peak > SILENCE {
            audio.scale(self.params.get(Self::TARGET) / peak);
        }
        Ok(Block::Audio(audio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Signal, wire};
    use patchwire_core::Graph;

    #[test]
    fn test_scales_to_target() {
        let mut graph = Graph::new(48000.0);
        let id = wire(
            &mut graph,
            Signal::boxed(vec![0.1, -0.25, 0.05]),
            Box::new(Normalize::new(48000.0)),
        );
        graph.params(id).unwrap().set(Normalize::TARGET, 0.5);
        let out = graph.pull(id, 3).into_audio();
        assert!((out.left[1] + 0.5).abs() < 1e-6);
        assert!((out.left[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_silence_untouched() {
        let mut graph = Graph::new(48000.0);
        let id = wire(&mut graph, Signal::boxed(vec![1e-8; 4]), Box::new(Normalize::new(48000.0)));
        let out = graph.pull(id, 4).into_audio();
        assert_eq!(out.left[0], 1e-8);
    }
}
