//! Spectral pitch wobble driven by a smoothed random walk.

use patchwire_core::{
    Block, Lcg, Module, ModuleError, ParamDescriptor, ParamStore, ParamUnit, PortIo, PortSpec,
    SpectralProcessor,
};

use crate::spectral::{DryDelay, MagnitudeWarp};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

const WINDOW: usize = 1024;

/// Random pitch drift in cents, applied per STFT frame.
///
/// Every `1/rate` seconds a new target offset is drawn from an LCG in
/// `±depth` cents. The current offset glides toward it, and each frame's
/// magnitudes are resampled by `2^(cents/1200)` with linear interpolation.
/// Phases are kept, so this is a timbral wobble rather than a true
/// transposition.
///
/// # Parameters
///
/// - `depth`: 0-100 cents (default 20)
/// - `rate`: 0.1-20 Hz (default 2)
/// - `mix`: 0.0-1.0 (default 1.0)
pub struct PitchJitter {
    stft: SpectralProcessor,
    warp: MagnitudeWarp,
    dry: DryDelay,
    rng: Lcg,
    cents: f32,
    target: f32,
    since_target: f32,
    sample_rate: f32,
    params: ParamStore,
}

impl PitchJitter {
    /// Depth in cents.
    pub const DEPTH: usize = 0;
    /// Target rate in Hz.
    pub const RATE: usize = 1;
    /// Dry/wet mix.
    pub const MIX: usize = 2;

    /// Creates a jitter processor at the default settings.
    pub fn new(sample_rate: f32) -> Self {
        let stft = SpectralProcessor::new(WINDOW);
        Self {
            warp: MagnitudeWarp::new(stft.bins()),
            dry: DryDelay::new(stft.latency()),
            stft,
            rng: Lcg::default(),
            cents: 0.0,
            target: 0.0,
            since_target: f32::INFINITY,
            sample_rate,
            params: ParamStore::new(vec![
                ParamDescriptor::custom("Depth", "depth", 0.0, 100.0, 20.0)
                    .with_unit(ParamUnit::Cents),
                ParamDescriptor::rate_hz("Rate", "rate", 0.1, 20.0, 2.0),
                ParamDescriptor::mix().with_default(1.0),
            ]),
        }
    }

    /// Current pitch offset in cents.
    pub fn cents(&self) -> f32 {
        self.cents
    }
}

impl Module for PitchJitter {
    fn kind(&self) -> &'static str {
        "pitch_jitter"
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
        let depth = self.params.get(Self::DEPTH);
        let rate = self.params.get(Self::RATE);
        let frame_dt = self.stft.hop() as f32 / self.sample_rate;
        let glide = (frame_dt * rate * 2.0).min(1.0);

        let Self {
            stft,
            warp,
            rng,
            cents,
            target,
            since_target,
            ..
        } = self;
        let mut ratio = 1.0;
        let mut wet = stft.process(&input, |channel, bins| {
            // Both channels of a frame share one ratio.
            if channel == 0 {
                *since_target += frame_dt;
                if *since_target >= 1.0 / rate {
                    *since_target = 0.0;
                    *target = rng.next_bipolar() * depth;
                }
                *cents += (*target - *cents) * glide;
                ratio = libm::exp2f(*cents / 1200.0);
            }
            warp.interpolated(bins, ratio);
        });
        self.dry.mix_into(&input, &mut wet, self.params.get(Self::MIX));
        Ok(Block::Audio(wet))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    fn reset(&mut self) {
        self.stft.reset();
        self.dry.clear();
        self.rng = Lcg::default();
        self.cents = 0.0;
        self.target = 0.0;
        self.since_target = f32::INFINITY;
    }

    fn latency_samples(&self) -> usize {
        self.stft.latency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Signal, render, wire};
    use patchwire_core::Graph;

    fn tone(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.07).sin() * 0.5).collect()
    }

    #[test]
    fn test_zero_depth_is_delayed_identity() {
        let mut graph = Graph::new(48000.0);
        let input = tone(4096);
        let id = wire(&mut graph, Signal::boxed(input.clone()), Box::new(PitchJitter::new(48000.0)));
        graph.params(id).unwrap().set(PitchJitter::DEPTH, 0.0);
        let out = render(&mut graph, id, 4096, 333);
        for n in WINDOW..4096 {
            assert!((out[n] - input[n - WINDOW]).abs() < 1e-3, "sample {n}");
        }
    }

    #[test]
    fn test_offset_stays_within_depth() {
        let mut graph = Graph::new(48000.0);
        let id = wire(&mut graph, Signal::boxed(tone(96000)), Box::new(PitchJitter::new(48000.0)));
        let params = graph.params(id).unwrap();
        params.set(PitchJitter::DEPTH, 50.0);
        params.set(PitchJitter::RATE, 10.0);
        let mut moved = false;
        for _ in 0..100 {
            graph.pull(id, 960);
            let cents = graph.module_as::<PitchJitter>(id).unwrap().cents();
            assert!(cents.abs() <= 50.0 + 1e-3);
            moved |= cents.abs() > 1.0;
        }
        assert!(moved);
    }

    #[test]
    fn test_reset_restarts_walk() {
        let run = |graph: &mut Graph, id| {
            for _ in 0..20 {
                graph.pull(id, 512);
            }
            graph.module_as::<PitchJitter>(id).unwrap().cents()
        };
        let mut graph = Graph::new(48000.0);
        let id = wire(&mut graph, Signal::boxed(vec![0.0; 1]), Box::new(PitchJitter::new(48000.0)));
        let first = run(&mut graph, id);
        graph.reset();
        assert_eq!(graph.module_as::<PitchJitter>(id).unwrap().cents(), 0.0);
        assert_eq!(run(&mut graph, id), first);
    }
}
