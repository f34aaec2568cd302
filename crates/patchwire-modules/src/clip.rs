//! Hard clipper.

use patchwire_core::{Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Smallest clip ceiling.
const FLOOR: f32 = 1e-6;

/// Where the clip ceiling comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClipMode {
    /// A share of the current block's peak.
    #[default]
    Relative,
    /// A fixed level.
    Absolute,
}

impl ClipMode {
    /// The mode at parameter index `index`.
    pub fn from_index(index: usize) -> Self {
        if index == 1 {
            ClipMode::Absolute
        } else {
            ClipMode::Relative
        }
    }
}

/// Clamps samples to a ceiling.
///
/// In relative mode the ceiling is `percent` of the block peak, and with
/// `normalize` on the block is first divided by that share so the clipped
/// result keeps its level. A silent block passes through.
///
/// # Parameters
///
/// - `mode`: relative, absolute
/// - `level`: 0.01-2.0 absolute ceiling (default 1.0)
/// - `percent`: 1-100 % of peak (default 100)
/// - `normalize`: rescale before a relative clip (default off)
pub struct Clip {
    params: ParamStore,
}

impl Clip {
    /// Mode index.
    pub const MODE: usize = 0;
    /// Absolute ceiling.
    pub const LEVEL: usize = 1;
    /// Relative ceiling in percent.
    pub const PERCENT: usize = 2;
    /// Normalize toggle.
    pub const NORMALIZE: usize = 3;

    /// Creates a relative clipper at 100 %, which leaves audio untouched.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            params: ParamStore::new(vec![
                ParamDescriptor::choice("Mode", "mode", 2),
                ParamDescriptor::custom("Absolute Level", "level", 0.01, 2.0, 1.0)
                    .with_short_name("Level"),
                ParamDescriptor::custom("Relative Level", "percent", 1.0, 100.0, 100.0)
                    .with_step(1.0)
                    .with_short_name("Percent"),
                ParamDescriptor::toggle("Normalize", "normalize", false),
            ]),
        }
    }

    /// Active mode.
    pub fn mode(&self) -> ClipMode {
        ClipMode::from_index(self.params.get_index(Self::MODE))
    }
}

impl Module for Clip {
    fn kind(&self) -> &'static str {
        "clip"
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
        match self.mode() {
            ClipMode::Absolute => audio.clip(self.params.get(Self::LEVEL).max(FLOOR)),
            ClipMode::Relative => {
                let peak = audio.peak();
                if peak > 0.0 {
                    let share = self.params.get(Self::PERCENT) / 100.0;
                    if self.params.get_bool(Self::NORMALIZE) {
                        audio.scale(1.0 / share);
                    }
                    audio.clip((peak * share).max(FLOOR));
                }
            }
        }
        Ok(Block::Audio(audio))
    }
}
