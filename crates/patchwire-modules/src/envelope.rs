//! ADSR envelope.

use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, StereoBuffer,
};

const INPUTS: [PortSpec; 2] = [PortSpec::audio("audio"), PortSpec::control("gate")];
const OUTPUTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Gate control values above this count as held.
const GATE_THRESHOLD: f32 = 0.5;

/// Distance from a segment's goal at which the segment ends.
const SNAP: f32 = 1e-6;

/// Envelope stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Output is zero.
    #[default]
    Idle,
    /// Rising to 1.
    Attack,
    /// Falling to the sustain level.
    Decay,
    /// Holding the sustain level while the gate is held.
    Sustain,
    /// Falling to zero after the gate drops.
    Release,
}

/// Linear attack-decay-sustain-release envelope.
///
/// The gate comes from the `gate` control input when it is connected and from
/// the `gate` parameter otherwise. A rising gate restarts the attack from the
/// current level. With audio connected the output is the input scaled by the
/// envelope, without it the envelope itself as a DC signal.
///
/// # Parameters
///
/// - `attack_ms`: 1-5000 ms (default 10)
/// - `decay_ms`: 1-5000 ms (default 100)
/// - `sustain`: 0.0-1.0 (default 0.7)
/// - `release_ms`: 1-5000 ms (default 200)
/// - `gate`: manual gate (default off)
pub struct Envelope {
    stage: EnvelopeStage,
    level: f32,
    release_step: f32,
    gate: bool,
    sample_rate: f32,
    params: ParamStore,
}

impl Envelope {
    /// Attack time.
    pub const ATTACK: usize = 0;
    /// Decay time.
    pub const DECAY: usize = 1;
    /// Sustain level.
    pub const SUSTAIN: usize = 2;
    /// Release time.
    pub const RELEASE: usize = 3;
    /// Manual gate.
    pub const GATE: usize = 4;

    /// Creates an idle envelope.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_step: 0.0,
            gate: false,
            sample_rate,
            params: ParamStore::new(vec![
                ParamDescriptor::time_ms("Attack", "attack_ms", 1.0, 5000.0, 10.0),
                ParamDescriptor::time_ms("Decay", "decay_ms", 1.0, 5000.0, 100.0),
                ParamDescriptor::custom("Sustain", "sustain", 0.0, 1.0, 0.7),
                ParamDescriptor::time_ms("Release", "release_ms", 1.0, 5000.0, 200.0),
                ParamDescriptor::toggle("Gate", "gate", false),
            ]),
        }
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current level.
    pub fn level(&self) -> f32 {
        self.level
    }

    fn samples(&self, index: usize) -> f32 {
        (self.params.get(index) * 0.001 * self.sample_rate).max(1.0)
    }

    fn set_gate(&mut self, on: bool) {
        if on == self.gate {
            return;
        }
        self.gate = on;
        if on {
            self.stage = EnvelopeStage::Attack;
        } else if self.stage != EnvelopeStage::Idle {
            self.stage = EnvelopeStage::Release;
            self.release_step = self.level / self.samples(Self::RELEASE);
        }
    }

    fn advance(&mut self, sustain: f32) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => self.level = 0.0,
            EnvelopeStage::Attack => {
                self.level += 1.0 / self.samples(Self::ATTACK);
                if self.level >= 1.0 - SNAP {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                self.level -= (1.0 - sustain) / self.samples(Self::DECAY);
                if self.level <= sustain + SNAP {
                    self.level = sustain;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => self.level = sustain,
            EnvelopeStage::Release => {
                self.level -= self.release_step;
                if self.level <= SNAP {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }
        self.level
    }
}

impl Module for Envelope {
    fn kind(&self) -> &'static str {
        "envelope"
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
        let gate = io
            .is_input_connected(1)
            .then(|| io.receive_control(1, frames));
        let audio = io
            .is_input_connected(0)
            .then(|| io.receive_audio(0, frames));
        let manual = self.params.get_bool(Self::GATE);
        let sustain = self.params.get(Self::SUSTAIN);

        let mut out = StereoBuffer::new(frames);
        for i in 0..frames {
            let held = gate.as_ref().map_or(manual, |g| g[i] > GATE_THRESHOLD);
            self.set_gate(held);
            let level = self.advance(sustain);
            match &audio {
                Some(input) => {
                    out.left[i] = input.left[i] * level;
                    out.right[i] = input.right[i] * level;
                }
                None => {
                    out.left[i] = level;
                    out.right[i] = level;
                }
            }
        }
        Ok(Block::Audio(out))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.gate = false;
    }
}
