//! Four-input mixer with per-input faders and mutes.

use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, StereoBuffer,
    db_to_linear,
};

const INPUTS: [PortSpec; 4] = [
    PortSpec::audio("in 1"),
    PortSpec::audio("in 2"),
    PortSpec::audio("in 3"),
    PortSpec::audio("in 4"),
];
const OUTPUTS: [PortSpec; 1] = [PortSpec::audio("out")];

/// Fader range shared by the inputs and the master.
const DB_MIN: f32 = -80.0;
const DB_MAX: f32 = 10.0;

/// 4:1 mixer.
///
/// Each connected input is scaled by its fader and summed; the master fader
/// is applied last and the result is hard-clipped to ±1. Unconnected inputs
/// are not pulled.
///
/// # Parameters
///
/// | Index | Id | Range | Default |
/// |-------|----|-------|---------|
/// | 0-3 | `in1_db`..`in4_db` | -80..10 dB | -6 |
/// | 4-7 | `in1_mute`..`in4_mute` | off/on | off |
/// | 8 | `master_db` | -80..10 dB | 0 |
/// | 9 | `master_mute` | off/on | off |
pub struct Sum {
    params: ParamStore,
}

impl Sum {
    /// Index of the first input level; input `i` is at `INPUT_DB + i`.
    pub const INPUT_DB: usize = 0;
    /// Index of the first input mute; input `i` is at `INPUT_MUTE + i`.
    pub const INPUT_MUTE: usize = 4;
    /// Master level.
    pub const MASTER_DB: usize = 8;
    /// Master mute.
    pub const MASTER_MUTE: usize = 9;

    /// Creates a mixer with every input at -6 dB.
    pub fn new(_sample_rate: f32) -> Self {
        let level = |name, id| ParamDescriptor::gain_db(name, id, DB_MIN, DB_MAX, -6.0);
        Self {
            params: ParamStore::new(vec![
                level("Input 1", "in1_db"),
                level("Input 2", "in2_db"),
                level("Input 3", "in3_db"),
                level("Input 4", "in4_db"),
                ParamDescriptor::toggle("Mute 1", "in1_mute", false),
                ParamDescriptor::toggle("Mute 2", "in2_mute", false),
                ParamDescriptor::toggle("Mute 3", "in3_mute", false),
                ParamDescriptor::toggle("Mute 4", "in4_mute", false),
                ParamDescriptor::gain_db("Master", "master_db", DB_MIN, DB_MAX, 0.0),
                ParamDescriptor::toggle("Master Mute", "master_mute", false),
            ]),
        }
    }
}

impl Module for Sum {
    fn kind(&self) -> &'static str {
        "sum"
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
        let mut out = StereoBuffer::new(frames);
        for input in 0..INPUTS.len() {
            if !io.is_input_connected(input) {
                continue;
            }
            // Muted inputs are still pulled so their sources keep time.
            let audio = io.receive_audio(input, frames);
            if !self.params.get_bool(Self::INPUT_MUTE + input) {
                let gain = db_to_linear(self.params.get(Self::INPUT_DB + input));
                out.accumulate_scaled(&audio, gain);
            }
        }
        if self.params.get_bool(Self::MASTER_MUTE) {
            out.clear();
            return Ok(Block::Audio(out));
        }
        out.scale(db_to_linear(self.params.get(Self::MASTER_DB)));
        out.clip(1.0);
        Ok(Block::Audio(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Signal;
    use patchwire_core::{Graph, PortId};

    fn mixer(graph: &mut Graph, levels: &[f32]) -> patchwire_core::ModuleId {
        let sum = graph.add(Box::new(Sum::new(48000.0)));
        for (i, &level) in levels.iter().enumerate() {
            let src = graph.add(Signal::boxed(vec![level; 64]));
            graph.connect(PortId::output(src, 0), PortId::input(sum, i)).unwrap();
        }
        sum
    }

    #[test]
    fn test_sums_with_faders() {
        let mut graph = Graph::new(48000.0);
        let sum = mixer(&mut graph, &[0.2, 0.3]);
        let params = graph.params(sum).unwrap();
        params.set(Sum::INPUT_DB, 0.0);
        params.set(Sum::INPUT_DB + 1, 0.0);
        let out = graph.pull(sum, 16).into_audio();
        assert!((out.left[0] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_mute_and_clip() {
        let mut graph = Graph::new(48000.0);
        let sum = mixer(&mut graph, &[0.9, 0.9, 0.9]);
        let params = graph.params(sum).unwrap();
        for i in 0..3 {
            params.set(Sum::INPUT_DB + i, 0.0);
        }
        assert_eq!(graph.pull(sum, 8).into_audio().left[0], 1.0);

        params.set_bool(Sum::INPUT_MUTE, true);
        params.set_bool(Sum::INPUT_MUTE + 1, true);
        let out = graph.pull(sum, 8).into_audio();
        assert!((out.left[0] - 0.9).abs() < 1e-5);

        params.set_bool(Sum::MASTER_MUTE, true);
        assert_eq!(graph.pull(sum, 8).into_audio().peak(), 0.0);
    }
}
