//! Filtered white noise source.

use patchwire_core::{
    Block, Lcg, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, StereoBuffer,
    db_to_linear, equal_power_pan, flush_denormal,
};

const AUDIO_OUT: [PortSpec; 1] = [PortSpec::audio("audio")];

/// One-pole filter pair for a single channel.
#[derive(Debug, Clone, Default)]
struct Tone {
    hp_in: f32,
    hp_out: f32,
    lp_out: f32,
}

impl Tone {
    #[inline]
    fn process(&mut self, x: f32, hp: f32, lp: f32) -> f32 {
        let y = hp * (self.hp_out + x - self.hp_in);
        self.hp_in = x;
        self.hp_out = flush_denormal(y);
        self.lp_out = flush_denormal(lp * self.hp_out + (1.0 - lp) * self.lp_out);
        self.lp_out
    }
}

/// Stereo static.
///
/// Uniform white noise per channel through a one-pole high-pass with
/// coefficient `1 - high_pass` and a one-pole low-pass with coefficient
/// `low_pass`, then gained and panned. At the defaults (`high_pass` 0,
/// `low_pass` 1) both filters are transparent.
///
/// # Parameters
///
/// - `level`: -80 to 0 dB (default -20)
/// - `high_pass`: 0.0-0.99 (default 0)
/// - `low_pass`: 0.01-1.0 (default 1)
/// - `pan`: -1.0 to 1.0 (default 0)
pub struct StaticNoise {
    rng: [Lcg; 2],
    tone: [Tone; 2],
    params: ParamStore,
}

impl StaticNoise {
    /// Output level.
    pub const LEVEL: usize = 0;
    /// High-pass amount.
    pub const HIGH_PASS: usize = 1;
    /// Low-pass coefficient.
    pub const LOW_PASS: usize = 2;
    /// Stereo position.
    pub const PAN: usize = 3;

    /// Creates unfiltered static at -20 dB.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            rng: [Lcg::new(0x5eed_0001), Lcg::new(0x5eed_0002)],
            tone: [Tone::default(), Tone::default()],
            params: ParamStore::new(vec![
                ParamDescriptor::gain_db("Level", "level", -80.0, 0.0, -20.0),
                ParamDescriptor::custom("High-pass", "high_pass", 0.0, 0.99, 0.0)
                    .with_short_name("HP"),
                ParamDescriptor::custom("Low-pass", "low_pass", 0.01, 1.0, 1.0)
                    .with_short_name("LP"),
                ParamDescriptor::custom("Pan", "pan", -1.0, 1.0, 0.0),
            ]),
        }
    }
}

impl Module for StaticNoise {
    fn kind(&self) -> &'static str {
        "static"
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
        let gain = db_to_linear(self.params.get(Self::LEVEL));
        let hp = 1.0 - self.params.get(Self::HIGH_PASS);
        let lp = self.params.get(Self::LOW_PASS);
        let (pan_l, pan_r) = equal_power_pan(self.params.get(Self::PAN));

        let mut out = StereoBuffer::new(frames);
        for (ch, (samples, pan)) in [(&mut out.left, pan_l), (&mut out.right, pan_r)]
            .into_iter()
            .enumerate()
        {
            for s in samples.iter_mut() {
                let x = self.rng[ch].next_bipolar();
                *s = self.tone[ch].process(x, hp, lp) * gain * pan;
            }
        }
        Ok(Block::Audio(out))
    }

    fn reset(&mut self) {
        self.tone = [Tone::default(), Tone::default()];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwire_core::Graph;

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn test_level_and_range() {
        let mut graph = Graph::new(48000.0);
        let id = graph.add(Box::new(StaticNoise::new(48000.0)));
        graph.params(id).unwrap().set(StaticNoise::LEVEL, 0.0);
        let out = graph.pull(id, 4800).into_audio();
        let bound = core::f32::consts::FRAC_1_SQRT_2 + 1e-4;
        assert!(out.left.iter().all(|x| x.abs() <= bound));
        // Uniform noise in [-1, 1) has RMS 1/sqrt(3) before the centre pan.
        let expected = core::f32::consts::FRAC_1_SQRT_2 / 3.0_f32.sqrt();
        assert!((rms(&out.left) - expected).abs() < 0.03);
        assert_ne!(out.left, out.right);
    }

    #[test]
    fn test_low_pass_darkens() {
        let mut graph = Graph::new(48000.0);
        let open = graph.add(Box::new(StaticNoise::new(48000.0)));
        let dark = graph.add(Box::new(StaticNoise::new(48000.0)));
        graph.params(dark).unwrap().set(StaticNoise::LOW_PASS, 0.05);
        let a = graph.pull(open, 4800).into_audio();
        let b = graph.pull(dark, 4800).into_audio();
        assert!(rms(&b.left) < rms(&a.left) * 0.5);
    }

    #[test]
    fn test_hard_pan_silences_other_side() {
        let mut graph = Graph::new(48000.0);
        let id = graph.add(Box::new(StaticNoise::new(48000.0)));
        graph.params(id).unwrap().set(StaticNoise::PAN, 1.0);
        let out = graph.pull(id, 256).into_audio();
        assert!(out.left.iter().all(|x| x.abs() < 1e-6));
        assert!(out.right.iter().any(|x| x.abs() > 0.01));
    }
}
