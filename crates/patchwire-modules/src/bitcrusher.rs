//! Bit depth and sample rate reduction.

use libm::{exp2f, floorf, roundf};
use patchwire_core::{Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Lo-fi crusher.
///
/// Each sample is quantized to `round(x * 2^bits) / 2^bits`, then held for
/// `floor(sample_rate / rate)` frames. The hold counter runs across blocks so
/// the stair pattern does not restart at block edges.
///
/// # Parameters
///
/// - `bits`: 1-16 (default 8)
/// - `rate_hz`: 100-48000 Hz target rate (default 8000)
pub struct Bitcrusher {
    held: (f32, f32),
    counter: usize,
    sample_rate: f32,
    params: ParamStore,
}

impl Bitcrusher {
    /// Bit depth.
    pub const BITS: usize = 0;
    /// Target sample rate.
    pub const RATE: usize = 1;

    /// Creates an 8-bit, 8 kHz crusher.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            held: (0.0, 0.0),
            counter: 0,
            sample_rate,
            params: ParamStore::new(vec![
                ParamDescriptor::custom("Bit Depth", "bits", 1.0, 16.0, 8.0)
                    .with_step(1.0)
                    .with_short_name("Bits"),
                ParamDescriptor::rate_hz("Sample Rate", "rate_hz", 100.0, 48000.0, 8000.0)
                    .with_short_name("Rate"),
            ]),
        }
    }

    /// Frames each latched sample is held for.
    pub fn hold_frames(&self) -> usize {
        (floorf(self.sample_rate / self.params.get(Self::RATE)) as usize).max(1)
    }
}

impl Module for Bitcrusher {
    fn kind(&self) -> &'static str {
        "bitcrusher"
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
        let levels = exp2f(self.params.get(Self::BITS));
        let step = self.hold_frames();
        if self.counter >= step {
            self.counter = 0;
        }
        for i in 0..frames {
            if self.counter == 0 {
                self.held = (
                    roundf(audio.left[i] * levels) / levels,
                    roundf(audio.right[i] * levels) / levels,
                );
            }
            audio.left[i] = self.held.0;
            audio.right[i] = self.held.1;
            self.counter = (self.counter + 1) % step;
        }
        Ok(Block::Audio(audio))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    fn reset(&mut self) {
        self.held = (0.0, 0.0);
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Signal, render, wire};
    use patchwire_core::Graph;

    #[test]
    fn test_quantizes_to_bit_grid() {
        let mut graph = Graph::new(48000.0);
        let id = wire(
            &mut graph,
            Signal::boxed(vec![0.3, -0.3, 0.9]),
            Box::new(Bitcrusher::new(48000.0)),
        );
        let params = graph.params(id).unwrap();
        params.set(Bitcrusher::BITS, 2.0);
        params.set(Bitcrusher::RATE, 48000.0);
        let out = graph.pull(id, 3).into_audio().left;
        assert_eq!(out, vec![0.25, -0.25, 1.0]);
    }

    #[test]
    fn test_hold_runs_across_blocks() {
        let ramp: Vec<f32> = (0..12).map(|i| i as f32 / 16.0).collect();
        let mut graph = Graph::new(48000.0);
        let id = wire(&mut graph, Signal::boxed(ramp), Box::new(Bitcrusher::new(48000.0)));
        let params = graph.params(id).unwrap();
        params.set(Bitcrusher::BITS, 16.0);
        params.set(Bitcrusher::RATE, 12000.0);
        assert_eq!(graph.module_as::<Bitcrusher>(id).unwrap().hold_frames(), 4);
        let out = render(&mut graph, id, 12, 3);
        let expected: Vec<f32> = (0..12).map(|i| (i / 4 * 4) as f32 / 16.0).collect();
        assert_eq!(out, expected);
    }
}
