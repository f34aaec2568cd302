//! Channel vocoder.
//!
//! The modulator is split into eight speech bands. An envelope follower on
//! each band scales the same band of the carrier, and the bands are summed.

use libm::{expf, sqrtf};
use patchwire_core::{
    Biquad, BiquadCoefficients, Block, Lcg, Module, ModuleError, ParamDescriptor, ParamStore,
    PortIo, PortSpec, StereoBuffer, flush_denormal,
};
use tracing::debug;

use crate::Waveform;
use crate::oscillator::wrap;

const INPUTS: [PortSpec; 2] = [PortSpec::audio("modulator"), PortSpec::audio("carrier")];
const OUTPUTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Band edges in Hz.
const BANDS: [(f32, f32); 8] = [
    (200.0, 300.0),
    (300.0, 450.0),
    (450.0, 700.0),
    (700.0, 1100.0),
    (1100.0, 1800.0),
    (1800.0, 2800.0),
    (2800.0, 4200.0),
    (4200.0, 6000.0),
];

/// Follower attack in seconds.
const ATTACK: f32 = 0.005;
/// Follower release in seconds.
const RELEASE: f32 = 0.05;

/// Built-in carrier, stored in the `carrier` parameter as its index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Carrier {
    /// Sawtooth.
    #[default]
    Saw,
    /// Square.
    Square,
    /// Sine.
    Sine,
    /// White noise.
    Noise,
}

impl Carrier {
    /// All carriers in parameter order.
    pub const ALL: [Carrier; 4] = [Carrier::Saw, Carrier::Square, Carrier::Sine, Carrier::Noise];

    /// The carrier at parameter index `index`, defaulting to saw.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }
}

/// One analysis/synthesis band.
struct Band {
    modulator: [Biquad; 2],
    carrier: [Biquad; 2],
    envelope: f32,
}

impl Band {
    fn new(low: f32, high: f32, sample_rate: f32) -> Self {
        let center = sqrtf(low * high);
        let coeffs = BiquadCoefficients::bandpass(center, center / (high - low), sample_rate);
        let section = || Biquad::with_coefficients(coeffs);
        Self {
            modulator: [section(), section()],
            carrier: [section(), section()],
            envelope: 0.0,
        }
    }
}

fn cascade(sections: &mut [Biquad; 2], x: f32) -> f32 {
    let first = sections[0].process(x);
    sections[1].process(first)
}

/// Eight-band vocoder.
///
/// Input 0 is the modulator (usually speech). When input 1 is connected it
/// replaces the built-in carrier. Bands above 0.49 of the sample rate are
/// left out. The output is mono on both channels.
///
/// # Parameters
///
/// - `carrier`: saw, square, sine, noise (default saw)
/// - `frequency`: 20-2000 Hz built-in carrier pitch (default 110)
/// - `boost`: 0.0-2.0 envelope gain (default 1)
/// - `noise`: 0.0-1.0 noise times modulator added on top (default 0)
pub struct Vocoder {
    bands: Vec<Band>,
    attack: f32,
    release: f32,
    phase: f32,
    rng: Lcg,
    sample_rate: f32,
    params: ParamStore,
}

impl Vocoder {
    /// Built-in carrier index.
    pub const CARRIER: usize = 0;
    /// Built-in carrier pitch.
    pub const FREQUENCY: usize = 1;
    /// Envelope gain.
    pub const BOOST: usize = 2;
    /// Noise mix.
    pub const NOISE: usize = 3;

    /// Creates a vocoder with a 110 Hz saw carrier.
    pub fn new(sample_rate: f32) -> Self {
        let mut vocoder = Self {
            bands: Vec::new(),
            attack: 0.0,
            release: 0.0,
            phase: 0.0,
            rng: Lcg::default(),
            sample_rate,
            params: ParamStore::new(vec![
                ParamDescriptor::choice("Carrier", "carrier", Carrier::ALL.len()),
                ParamDescriptor::rate_hz("Carrier Pitch", "frequency", 20.0, 2000.0, 110.0)
                    .with_short_name("Pitch"),
                ParamDescriptor::custom("Formant Boost", "boost", 0.0, 2.0, 1.0)
                    .with_short_name("Boost"),
                ParamDescriptor::custom("Noise Mix", "noise", 0.0, 1.0, 0.0)
                    .with_short_name("Noise"),
            ]),
        };
        vocoder.build();
        vocoder
    }

    /// Number of active bands at the current sample rate.
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn build(&mut self) {
        let sr = self.sample_rate;
        self.bands = BANDS
            .iter()
            .filter(|&&(_, high)| high < 0.49 * sr)
            .map(|&(low, high)| Band::new(low, high, sr))
            .collect();
        self.attack = expf(-1.0 / (sr * ATTACK));
        self.release = expf(-1.0 / (sr * RELEASE));
        debug!(bands = self.bands.len(), sample_rate = sr, "vocoder_bands");
    }

    fn carrier_sample(&mut self, kind: Carrier, inc: f32) -> f32 {
        let p = self.phase;
        self.phase = wrap(self.phase + inc);
        match kind {
            Carrier::Saw => Waveform::Saw.sample(p),
            Carrier::Square => Waveform::Square.sample(p),
            Carrier::Sine => Waveform::Sine.sample(p),
            Carrier::Noise => self.rng.next_bipolar(),
        }
    }
}

impl Module for Vocoder {
    fn kind(&self) -> &'static str {
        "vocoder"
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
        let modulator = io.receive_audio(0, frames);
        let external = io
            .is_input_connected(1)
            .then(|| io.receive_audio(1, frames));
        let kind = Carrier::from_index(self.params.get_index(Self::CARRIER));
        let inc = self.params.get(Self::FREQUENCY) / self.sample_rate;
        let boost = self.params.get(Self::BOOST);
        let noise = self.params.get(Self::NOISE);
        let (attack, release) = (self.attack, self.release);

        let mut out = StereoBuffer::new(frames);
        for i in 0..frames {
            let m = modulator.left[i];
            let c = match &external {
                Some(carrier) => carrier.left[i],
                None => self.carrier_sample(kind, inc),
            };
            let mut y = 0.0;
            for band in &mut self.bands {
                let rect = cascade(&mut band.modulator, m).abs();
                let coeff = if rect > band.envelope { attack } else { release };
                band.envelope = flush_denormal(coeff * band.envelope + (1.0 - coeff) * rect);
                y += cascade(&mut band.carrier, c) * band.envelope * boost;
            }
            if noise > 0.0 {
                y += self.rng.next_bipolar() * noise * m;
            }
            out.left[i] = y;
            out.right[i] = y;
        }
        Ok(Block::Audio(out))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.build();
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.build();
    }
}
