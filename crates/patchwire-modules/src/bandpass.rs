//! Band-limiting filter.

use core::f32::consts::FRAC_1_SQRT_2;

use patchwire_core::{
    Biquad, BiquadCoefficients, Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo,
    PortSpec,
};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Lowest edge; a low edge here disables the high-pass.
const MIN_EDGE: f32 = 1.0;

/// High-pass at `low` cascaded into low-pass at `high`, both Butterworth.
///
/// # Parameters
///
/// - `low_hz`: 1-20000 Hz (default 1)
/// - `high_hz`: 1-20000 Hz (default 20000)
///
/// Edges are clamped below Nyquist and `high` is kept above `low`. A low edge
/// at its 1 Hz minimum leaves the high-pass out.
pub struct Bandpass {
    highpass: [Biquad; 2],
    lowpass: [Biquad; 2],
    edges: (f32, f32),
    sample_rate: f32,
    params: ParamStore,
}

impl Bandpass {
    /// Lower edge.
    pub const LOW: usize = 0;
    /// Upper edge.
    pub const HIGH: usize = 1;

    /// Creates a full-range band.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            highpass: [Biquad::new(), Biquad::new()],
            lowpass: [Biquad::new(), Biquad::new()],
            edges: (f32::NAN, f32::NAN),
            sample_rate,
            params: ParamStore::new(vec![
                ParamDescriptor::rate_hz("Low Cutoff", "low_hz", 1.0, 20000.0, 1.0)
                    .with_short_name("Low"),
                ParamDescriptor::rate_hz("High Cutoff", "high_hz", 1.0, 20000.0, 20000.0)
                    .with_short_name("High"),
            ]),
        };
        filter.update();
        filter
    }

    /// Effective `(low, high)` edges in Hz.
    pub fn edges(&self) -> (f32, f32) {
        self.edges
    }

    fn update(&mut self) {
        let nyquist = 0.49 * self.sample_rate;
        let low = self.params.get(Self::LOW).min(nyquist - 1.0).max(MIN_EDGE);
        let high = self.params.get(Self::HIGH).max(low + 1.0).min(nyquist);
        if (low, high) == self.edges {
            return;
        }
        self.edges = (low, high);
        let hp = if low <= MIN_EDGE {
            BiquadCoefficients::PASSTHROUGH
        } else {
            BiquadCoefficients::highpass(low, FRAC_1_SQRT_2, self.sample_rate)
        };
        let lp = BiquadCoefficients::lowpass(high, FRAC_1_SQRT_2, self.sample_rate);
        for section in &mut self.highpass {
            section.set_coefficients(hp);
        }
        for section in &mut self.lowpass {
            section.set_coefficients(lp);
        }
    }
}

impl Module for Bandpass {
    fn kind(&self) -> &'static str {
        "bandpass"
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
        self.update();
        for (ch, samples) in [&mut audio.left, &mut audio.right].into_iter().enumerate() {
            for x in samples.iter_mut() {
                *x = self.lowpass[ch].process(self.highpass[ch].process(*x));
            }
        }
        Ok(Block::Audio(audio))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.edges = (f32::NAN, f32::NAN);
        self.update();
    }

    fn reset(&mut self) {
        for section in self.highpass.iter_mut().chain(&mut self.lowpass) {
            section.clear();
        }
    }
}
