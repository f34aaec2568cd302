//! patchwire Modules - the module library
//!
//! Every type here implements [`patchwire_core::Module`] and is constructed
//! with `new(sample_rate)`:
//!
//! ## Routing
//!
//! - [`Split`] - fan-out buffer, pulls its input once per logical block
//! - [`Sum`] - four-input mixer with faders, mutes and a master
//! - [`Endpoint`] - sink with volume and mute
//! - [`Gain`] - smoothed gain, the usual splice passthrough
//! - [`Pan`] - equal-power panner
//! - [`Crossfade`] - two-input blend
//!
//! ## Effects
//!
//! - [`Reverb`] - Schroeder comb/allpass reverb with growable lines
//! - [`ReverseDelay`] - backwards playback of the last window
//! - [`Convolve`] - FFT convolution with a loadable impulse response
//! - [`Slowdown`] - block-rate time warping of the upstream
//! - [`Normalize`] - per-block peak normalization
//! - [`Shuffle`] - random chunk reordering
//! - [`Bandpass`] - high-pass into low-pass band limiter
//! - [`Clip`] - absolute or peak-relative hard clipper
//! - [`Bitcrusher`] - bit depth and sample rate reduction
//! - [`Envelope`] - ADSR gate, applied to audio or emitted as DC
//! - [`SampleHold`] - random pitch jumps at a fixed rate
//! - [`Hold`] - loops the last few blocks on demand
//!
//! ## Spectral
//!
//! - [`Formant`] - envelope shift by bin remapping
//! - [`PitchJitter`] - random pitch wobble on magnitudes
//! - [`Vocoder`] - eight-band channel vocoder
//!
//! ## Sources and playback
//!
//! - [`Oscillator`], [`Lfo`], [`Constant`]
//! - [`StaticNoise`] - filtered white noise
//! - [`Player`] - sample player with cue handoff, crossfades and tempo detection
//!
//! ## Example
//!
//! ```rust,ignore
//! use patchwire_core::{Graph, PortId};
//! use patchwire_modules::{Endpoint, Oscillator, Reverb};
//!
//! let mut graph = Graph::new(48000.0);
//! let osc = graph.add(Box::new(Oscillator::new(48000.0)));
//! let verb = graph.add(Box::new(Reverb::new(48000.0)));
//! let out = graph.add(Box::new(Endpoint::new(48000.0)));
//! graph.connect(PortId::output(osc, 0), PortId::input(verb, 0))?;
//! graph.connect(PortId::output(verb, 0), PortId::input(out, 0))?;
//! let block = graph.pull(out, 512);
//! ```

pub mod bandpass;
pub mod bitcrusher;
pub mod bpm;
pub mod clip;
pub mod constant;
pub mod convolve;
pub mod crossfade;
pub mod endpoint;
pub mod envelope;
pub mod formant;
pub mod gain;
pub mod hold;
pub mod lfo;
pub mod normalize;
pub mod oscillator;
pub mod pan;
pub mod pitch_jitter;
pub mod player;
pub mod reverb;
pub mod reverse_delay;
pub mod sample_hold;
pub mod shuffle;
pub mod slowdown;
mod spectral;
pub mod split;
pub mod static_noise;
pub mod sum;
pub mod vocoder;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use bandpass::Bandpass;
pub use bitcrusher::Bitcrusher;
pub use bpm::{TapTempo, detect_bpm};
pub use clip::{Clip, ClipMode};
pub use constant::Constant;
pub use convolve::{Convolve, ConvolveHandle};
pub use crossfade::Crossfade;
pub use endpoint::Endpoint;
pub use envelope::{Envelope, EnvelopeStage};
pub use formant::Formant;
pub use gain::Gain;
pub use hold::{Hold, MAX_HOLD_BLOCKS};
pub use lfo::Lfo;
pub use normalize::Normalize;
pub use oscillator::{Oscillator, Waveform};
pub use pan::Pan;
pub use pitch_jitter::PitchJitter;
pub use player::{PlayState, Player, PlayerCommand, PlayerHandle};
pub use reverb::Reverb;
pub use reverse_delay::ReverseDelay;
pub use sample_hold::SampleHold;
pub use shuffle::Shuffle;
pub use slowdown::Slowdown;
pub use split::Split;
pub use static_noise::StaticNoise;
pub use sum::Sum;
pub use vocoder::{Carrier, Vocoder};
