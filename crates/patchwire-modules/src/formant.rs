//! Spectral formant shift.

use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, ParamUnit, PortIo, PortSpec,
    SpectralProcessor,
};

use crate::spectral::{DryDelay, MagnitudeWarp};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// STFT frame size; the hop is half of it.
pub const FORMANT_WINDOW: usize = 1024;

/// Moves the spectral envelope by `ratio` while each bin keeps its phase.
///
/// Bin `i` takes its magnitude from bin `floor(i / ratio)`. A ratio of 1 is
/// the identity, so the output is the input delayed by [`FORMANT_WINDOW`].
///
/// # Parameters
///
/// - `ratio`: 0.25-4.0 (default 1.0)
/// - `mix`: 0.0-1.0 (default 1.0)
pub struct Formant {
    stft: SpectralProcessor,
    warp: MagnitudeWarp,
    dry: DryDelay,
    params: ParamStore,
}

impl Formant {
    /// Envelope ratio.
    pub const RATIO: usize = 0;
    /// Dry/wet mix.
    pub const MIX: usize = 1;

    /// Creates an identity formant shifter.
    pub fn new(_sample_rate: f32) -> Self {
        let stft = SpectralProcessor::new(FORMANT_WINDOW);
        Self {
            warp: MagnitudeWarp::new(stft.bins()),
            dry: DryDelay::new(stft.latency()),
            stft,
            params: ParamStore::new(vec![
                ParamDescriptor::custom("Ratio", "ratio", 0.25, 4.0, 1.0).with_unit(ParamUnit::Ratio),
                ParamDescriptor::mix().with_default(1.0),
            ]),
        }
    }
}

impl Module for Formant {
    fn kind(&self) -> &'static str {
        "formant"
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
        let ratio = self.params.get(Self::RATIO);
        let warp = &mut self.warp;
        let mut wet = self.stft.process(&input, |_, bins| warp.nearest(bins, ratio));
        self.dry.mix_into(&input, &mut wet, self.params.get(Self::MIX));
        Ok(Block::Audio(wet))
    }

    fn reset(&mut self) {
        self.stft.reset();
        self.dry.clear();
    }

    fn latency_samples(&self) -> usize {
        self.stft.latency()
    }
}
