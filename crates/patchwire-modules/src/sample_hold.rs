//! Sample-and-hold pitch modulation.

use libm::{exp2f, floorf};
use patchwire_core::{
    Block, Lcg, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec,
    StereoBuffer,
};
use tracing::trace;

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Random pitch jumps at a fixed rate.
///
/// Each time the rate clock wraps a new playback ratio
/// `2^((u - 0.5) * depth / 12)` is drawn, and the block is read at
/// `i * ratio` with linear interpolation, clamped just short of its last
/// frame. The clock and the held ratio carry across blocks.
///
/// # Parameters
///
/// - `rate_hz`: 0.1-20 Hz (default 2)
/// - `depth`: 0-24 semitones peak to peak (default 12)
pub struct SampleHold {
    phase: f32,
    ratio: f32,
    rng: Lcg,
    sample_rate: f32,
    params: ParamStore,
}

impl SampleHold {
    /// Clock rate.
    pub const RATE: usize = 0;
    /// Pitch range in semitones.
    pub const DEPTH: usize = 1;

    /// Creates a 2 Hz, one-octave modulator.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            ratio: 1.0,
            rng: Lcg::default(),
            sample_rate,
            params: ParamStore::new(vec![
                ParamDescriptor::rate_hz("Rate", "rate_hz", 0.1, 20.0, 2.0),
                ParamDescriptor::custom("Depth", "depth", 0.0, 24.0, 12.0).with_step(0.1),
            ]),
        }
    }

    /// Playback ratio currently held.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }
}

impl Module for SampleHold {
    fn kind(&self) -> &'static str {
        "sample_hold"
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
        if frames < 2 {
            return Ok(Block::Audio(input));
        }
        let mut out = StereoBuffer::new(frames);
        let inc = self.params.get(Self::RATE) / self.sample_rate;
        let depth = self.params.get(Self::DEPTH);
        let last = (frames - 1) as f32 - 0.001;
        for i in 0..frames {
            self.phase += inc;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
                let semitones = (self.rng.next_unit() - 0.5) * depth;
                self.ratio = exp2f(semitones / 12.0);
                trace!(ratio = self.ratio, "sample_hold_jump");
            }
            let pos = (i as f32 * self.ratio).min(last);
            let i0 = floorf(pos) as usize;
            let frac = pos - i0 as f32;
            out.left[i] = input.left[i0] * (1.0 - frac) + input.left[i0 + 1] * frac;
            out.right[i] = input.right[i0] * (1.0 - frac) + input.right[i0 + 1] * frac;
        }
        Ok(Block::Audio(out))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.ratio = 1.0;
    }
}
