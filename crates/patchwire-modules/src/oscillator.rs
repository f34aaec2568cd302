//! Audio oscillator.
//!
//! A phase accumulator over `[0, 1)`. The frequency
//! glides toward a new frequency by 2% of the difference per block, which
//! turns parameter jumps into short sweeps instead of clicks. Waveforms are
//! naive (not band-limited).

use core::f32::consts::TAU;

use libm::{floorf, sinf};
use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, StereoBuffer,
};

const AUDIO_OUT: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Share of the remaining frequency distance covered per block.
const GLIDE: f32 = 0.02;

/// Oscillator waveform, stored in the `waveform` parameter as its index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Waveform {
    /// Pure tone.
    #[default]
    Sine,
    /// `2|2p - 1| - 1`.
    Triangle,
    /// `sign(2p - 1)`.
    Square,
    /// `2p - 1`.
    Saw,
}

impl Waveform {
    /// All waveforms in parameter order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Square,
        Waveform::Saw,
    ];

    /// The waveform at parameter index `index`, defaulting to sine.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    /// Value at phase `p` in `[0, 1)`.
    #[inline]
    pub fn sample(self, p: f32) -> f32 {
        match self {
            Waveform::Sine => sinf(TAU * p),
            Waveform::Triangle => 2.0 * (2.0 * p - 1.0).abs() - 1.0,
            Waveform::Square => {
                if p < 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
            Waveform::Saw => 2.0 * p - 1.0,
        }
    }
}

/// Wraps a phase into `[0, 1)`.
#[inline]
pub(crate) fn wrap(phase: f32) -> f32 {
    phase - floorf(phase)
}

/// Audio-rate source.
///
/// # Parameters
///
/// - `frequency`: 20-20000 Hz (default 440)
/// - `amplitude`: 0.0-1.0 (default 0.5)
/// - `waveform`: sine, triangle, square, saw
pub struct Oscillator {
    phase: f32,
    frequency: f32,
    sample_rate: f32,
    params: ParamStore,
}

impl Oscillator {
    /// Target frequency.
    pub const FREQUENCY: usize = 0;
    /// Output amplitude.
    pub const AMPLITUDE: usize = 1;
    /// Waveform index.
    pub const WAVEFORM: usize = 2;

    /// Creates a 440 Hz sine.
    pub fn new(sample_rate: f32) -> Self {
        let params = ParamStore::new(vec![
            ParamDescriptor::rate_hz("Frequency", "frequency", 20.0, 20000.0, 440.0)
                .with_short_name("Freq"),
            ParamDescriptor::custom("Amplitude", "amplitude", 0.0, 1.0, 0.5)
                .with_short_name("Amp"),
            ParamDescriptor::choice("Waveform", "waveform", Waveform::ALL.len()),
        ]);
        Self {
            phase: 0.0,
            frequency: params.get(Self::FREQUENCY),
            sample_rate,
            params,
        }
    }

    /// Frequency currently being played, which lags the parameter while gliding.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }
}

impl Module for Oscillator {
    fn kind(&self) -> &'static str {
        "oscillator"
    }

    fn inputs(&self) -> &[PortSpec] {
        &[]
    }

    fn outputs(&self) -> &[PortSpec] {
        &AUDIO_OUT
    }

    fn params(&self) -> &ParamStore {
        &self.params
    }

    fn generate(&mut self, frames: usize, _io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
        let target = self.params.get(Self::FREQUENCY);
        self.frequency += (target - self.frequency) * GLIDE;
        let amplitude = self.params.get(Self::AMPLITUDE);
        let waveform = Waveform::from_index(self.params.get_index(Self::WAVEFORM));
        let inc = self.frequency / self.sample_rate;

        let mut out = StereoBuffer::new(frames);
        for (l, r) in out.left.iter_mut().zip(out.right.iter_mut()) {
            let v = waveform.sample(self.phase) * amplitude;
            *l = v;
            *r = v;
            self.phase = wrap(self.phase + inc);
        }
        Ok(Block::Audio(out))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.frequency = self.params.get(Self::FREQUENCY);
    }
}
