//! Schroeder reverb with room-size dependent, growable delay lines.
//!
//! Four parallel comb filters are averaged and passed through two serial
//! allpass diffusers. Every delay is scaled by `0.7 + room·0.6`, so turning
//! room size up lengthens the filters while they run. The lines grow in
//! place and keep their contents, so the tail continues instead of
//! restarting.

use patchwire_core::{
    AllpassFilter, Block, CombFilter, Module, ModuleError, ParamDescriptor, ParamStore, PortIo,
    PortSpec, SmoothedParam, StereoBuffer,
};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Comb delays in seconds.
const COMB_SECS: [f32; 4] = [0.0297, 0.0371, 0.0411, 0.0437];

/// Allpass delays in seconds.
const ALLPASS_SECS: [f32; 2] = [0.005, 0.0017];

/// Extra delay on the right channel, in samples at 44.1 kHz.
const STEREO_SPREAD_44K: f32 = 23.0;

/// Comb feedback per unit of decay.
const FEEDBACK_SCALE: f32 = 0.8;

fn base_samples(secs: f32, sample_rate: f32) -> usize {
    (secs * sample_rate) as usize
}

/// `base·(0.7 + room·0.6)`, at least one sample.
fn effective_delay(base: usize, room: f32) -> usize {
    ((base as f32 * (0.7 + room * 0.6)) as usize).max(1)
}

struct Channel {
    combs: [CombFilter; 4],
    allpasses: [AllpassFilter; 2],
    comb_base: [usize; 4],
    allpass_base: [usize; 2],
}

impl Channel {
    fn new(sample_rate: f32, spread: usize, room: f32) -> Self {
        let comb_base = COMB_SECS.map(|s| base_samples(s, sample_rate) + spread);
        let allpass_base = ALLPASS_SECS.map(|s| base_samples(s, sample_rate) + spread);
        let mut channel = Self {
            combs: comb_base.map(|b| CombFilter::new(effective_delay(b, room))),
            allpasses: allpass_base.map(|b| AllpassFilter::new(effective_delay(b, room))),
            comb_base,
            allpass_base,
        };
        for ap in &mut channel.allpasses {
            ap.set_feedback(0.5);
        }
        channel
    }

    fn set_room(&mut self, room: f32) {
        for (comb, &base) in self.combs.iter_mut().zip(&self.comb_base) {
            comb.set_delay(effective_delay(base, room));
        }
        for (ap, &base) in self.allpasses.iter_mut().zip(&self.allpass_base) {
            ap.set_delay(effective_delay(base, room));
        }
    }

    fn set_tone(&mut self, feedback: f32, damping: f32) {
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
            comb.set_damp(damping);
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut sum = 0.0;
        for comb in &mut self.combs {
            sum += comb.process(input);
        }
        let mut wet = sum / self.combs.len() as f32;
        for ap in &mut self.allpasses {
            wet = ap.process(wet);
        }
        wet
    }

    fn clear(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::clear);
        self.allpasses.iter_mut().for_each(AllpassFilter::clear);
    }
}

/// Stereo Schroeder reverb.
///
/// # Parameters
///
/// - `mix`: 0.0-1.0, dry/wet balance (default 0.3)
/// - `decay`: 0.0-1.0, comb feedback is `decay·0.8` (default 0.5)
/// - `room`: 0.0-1.0, scales every delay by `0.7 + room·0.6` (default 0.5)
/// - `damping`: 0.0-1.0, high-frequency loss in the comb feedback (default 0.2)
pub struct Reverb {
    channels: [Channel; 2],
    mix: SmoothedParam,
    sample_rate: f32,
    cached_room: f32,
    cached_tone: (f32, f32),
    params: ParamStore,
}

impl Reverb {
    /// Dry/wet mix.
    pub const MIX: usize = 0;
    /// Decay amount.
    pub const DECAY: usize = 1;
    /// Room size.
    pub const ROOM: usize = 2;
    /// Damping.
    pub const DAMPING: usize = 3;

    /// Creates a reverb at the default settings.
    pub fn new(sample_rate: f32) -> Self {
        let params = ParamStore::new(vec![
            ParamDescriptor::mix().with_default(0.3),
            ParamDescriptor::custom("Decay", "decay", 0.0, 1.0, 0.5),
            ParamDescriptor::custom("Room Size", "room", 0.0, 1.0, 0.5).with_short_name("Room"),
            ParamDescriptor::custom("Damping", "damping", 0.0, 1.0, 0.2).with_short_name("Damp"),
        ]);
        let room = params.get(Self::ROOM);
        let mut reverb = Self {
            channels: Self::build_channels(sample_rate, room),
            mix: SmoothedParam::with_config(params.get(Self::MIX), sample_rate, 10.0),
            sample_rate,
            cached_room: room,
            cached_tone: (-1.0, -1.0),
            params,
        };
        reverb.update_filters();
        reverb
    }

    fn build_channels(sample_rate: f32, room: f32) -> [Channel; 2] {
        let spread = (STEREO_SPREAD_44K * sample_rate / 44100.0) as usize;
        [
            Channel::new(sample_rate, 0, room),
            Channel::new(sample_rate, spread, room),
        ]
    }

    /// Delay-line capacities of one channel's combs, for inspection.
    pub fn comb_capacities(&self, channel: usize) -> [usize; 4] {
        let ch = &self.channels[channel.min(1)];
        [0, 1, 2, 3].map(|i| ch.combs[i].capacity())
    }

    /// Comb filters of one channel.
    pub fn combs(&self, channel: usize) -> &[CombFilter] {
        &self.channels[channel.min(1)].combs
    }

    fn update_filters(&mut self) {
        let room = self.params.get(Self::ROOM);
        if room != self.cached_room {
            self.cached_room = room;
            for ch in &mut self.channels {
                ch.set_room(room);
            }
        }
        let tone = (
            self.params.get(Self::DECAY) * FEEDBACK_SCALE,
            self.params.get(Self::DAMPING),
        );
        if tone != self.cached_tone {
            self.cached_tone = tone;
            for ch in &mut self.channels {
                ch.set_tone(tone.0, tone.1);
            }
        }
    }
}

impl Module for Reverb {
    fn kind(&self) -> &'static str {
        "reverb"
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
        self.update_filters();
        self.mix.set_target(self.params.get(Self::MIX));

        let mut out = StereoBuffer::new(frames);
        let [left, right] = &mut self.channels;
        for i in 0..frames {
            let mix = self.mix.advance();
            let (xl, xr) = input.frame(i);
            out.left[i] = (1.0 - mix) * xl + mix * left.process(xl);
            out.right[i] = (1.0 - mix) * xr + mix * right.process(xr);
        }
        Ok(Block::Audio(out))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        self.channels = Self::build_channels(sample_rate, self.params.get(Self::ROOM));
        self.mix.set_sample_rate(sample_rate);
        self.cached_room = self.params.get(Self::ROOM);
        self.cached_tone = (-1.0, -1.0);
        self.update_filters();
    }

    fn reset(&mut self) {
        self.channels.iter_mut().for_each(Channel::clear);
        self.mix.set_immediate(self.params.get(Self::MIX));
    }
}
