//! Low-frequency sine for control inputs.

use core::f32::consts::TAU;

use libm::sinf;
use patchwire_core::{Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec};

use crate::oscillator::wrap;

const CONTROL_OUT: [PortSpec; 1] = [PortSpec::control("control")];

/// Sine control source.
///
/// # Parameters
///
/// - `frequency`: 0.01-20 Hz (default 1)
/// - `amplitude`: 0.0-1.0 (default 0.5)
pub struct Lfo {
    phase: f32,
    sample_rate: f32,
    params: ParamStore,
}

impl Lfo {
    /// Rate in Hz.
    pub const FREQUENCY: usize = 0;
    /// Output amplitude.
    pub const AMPLITUDE: usize = 1;

    /// Creates a 1 Hz LFO.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            sample_rate,
            params: ParamStore::new(vec![
                ParamDescriptor::rate_hz("Frequency", "frequency", 0.01, 20.0, 1.0)
                    .with_short_name("Rate"),
                ParamDescriptor::custom("Amplitude", "amplitude", 0.0, 1.0, 0.5)
                    .with_short_name("Amp"),
            ]),
        }
    }
}

impl Module for Lfo {
    fn kind(&self) -> &'static str {
        "lfo"
    }

    fn inputs(&self) -> &[PortSpec] {
        &[]
    }

    fn outputs(&self) -> &[PortSpec] {
        &CONTROL_OUT
    }

    fn params(&self) -> &ParamStore {
        &self.params
    }

    fn generate(&mut self, frames: usize, _io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
        let inc = self.params.get(Self::FREQUENCY) / self.sample_rate;
        let amplitude = self.params.get(Self::AMPLITUDE);
        let mut out = Vec::with_capacity(frames);
        for _ in 0..frames {
            out.push(sinf(TAU * self.phase) * amplitude);
            self.phase = wrap(self.phase + inc);
        }
        Ok(Block::Control(out))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}
