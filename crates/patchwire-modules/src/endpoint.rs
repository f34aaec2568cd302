//! Output fader: the sink every patch ends in.

use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, SmoothedParam,
    db_to_linear,
};

const INPUTS: [PortSpec; 1] = [PortSpec::audio("in")];

/// Bottom of the fader; treated as silence.
const DB_MIN: f32 = -80.0;
const DB_MAX: f32 = 10.0;

fn fader_gain(db: f32) -> f32 {
    if db <= DB_MIN { 0.0 } else { db_to_linear(db) }
}

/// Volume-controlled sink.
///
/// Starts fully down at -80 dB, which is silence. Volume changes are
/// smoothed over 5 ms.
pub struct Endpoint {
    gain: SmoothedParam,
    params: ParamStore,
}

impl Endpoint {
    /// Volume in dB.
    pub const VOLUME: usize = 0;
    /// Mute switch.
    pub const MUTE: usize = 1;

    /// Creates an endpoint with the fader down.
    pub fn new(sample_rate: f32) -> Self {
        let params = ParamStore::new(vec![
            ParamDescriptor::gain_db("Volume", "volume_db", DB_MIN, DB_MAX, DB_MIN),
            ParamDescriptor::toggle("Mute", "mute", false),
        ]);
        Self {
            gain: SmoothedParam::fast(fader_gain(DB_MIN), sample_rate),
            params,
        }
    }
}

impl Module for Endpoint {
    fn kind(&self) -> &'static str {
        "endpoint"
    }

    fn inputs(&self) -> &[PortSpec] {
        &INPUTS
    }

    fn outputs(&self) -> &[PortSpec] {
        &[]
    }

    fn params(&self) -> &ParamStore {
        &self.params
    }

    fn generate(&mut self, frames: usize, io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
        let mut audio = io.receive_audio(0, frames);
        if self.params.get_bool(Self::MUTE) {
            self.gain.set_immediate(0.0);
            audio.clear();
            return Ok(Block::Audio(audio));
        }
        self.gain.set_target(fader_gain(self.params.get(Self::VOLUME)));
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
    use crate::testing::{Signal, wire};
    use patchwire_core::Graph;

    #[test]
    fn test_defaults_to_silence() {
        let mut graph = Graph::new(48000.0);
        let out = wire(&mut graph, Signal::boxed(vec![0.5; 256]), Box::new(Endpoint::new(48000.0)));
        assert_eq!(graph.pull(out, 256).into_audio().peak(), 0.0);
    }

    #[test]
    fn test_volume_settles_and_mute() {
        let mut graph = Graph::new(48000.0);
        let out = wire(&mut graph, Signal::boxed(vec![0.5; 48000]), Box::new(Endpoint::new(48000.0)));
        let params = graph.params(out).unwrap();
        params.set(Endpoint::VOLUME, 0.0);
        let first = graph.pull(out, 4800).into_audio();
        assert!(first.left[0] < 0.1);
        assert!((first.left[4799] - 0.5).abs() < 1e-3);

        params.set_bool(Endpoint::MUTE, true);
        assert_eq!(graph.pull(out, 64).into_audio().peak(), 0.0);
    }
}
