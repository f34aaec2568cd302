//! patchwire core: typed signal graph and DSP primitives
//!
//! This crate holds everything a modular patch needs below the module
//! library: the data model, the pull evaluator, live-editing operations and
//! the building blocks DSP modules are written with.
//!
//! # Core Abstractions
//!
//! ## Data and ports
//!
//! - [`Block`]: N frames of [`DataType::Audio`], `Control`, `Midi` or `Cue` data
//! - [`PortId`] / [`PortSpec`]: port addresses and schemas
//!
//! ## Modules and graph
//!
//! - [`Module`]: the contract every processing unit implements
//! - [`Graph`]: arena of modules with [`connect`](Graph::connect),
//!   [`disconnect`](Graph::disconnect), [`pull`](Graph::pull),
//!   [`insert_module`](Graph::insert_module) and
//!   [`remove_module`](Graph::remove_module)
//! - [`Engine`]: non-blocking device-callback driver
//!
//! ## Parameters and assets
//!
//! - [`ParamStore`]: lock-free parameter values shared with the control thread
//! - [`AssetSlot`]: atomic hand-off of large assets such as [`SampleBuffer`]
//! - [`BackgroundJob`]: off-thread work with superseding results
//!
//! ## DSP building blocks
//!
//! - [`DelayLine`]: growable circular buffer
//! - [`CombFilter`] and [`AllpassFilter`]: reverb filters with resizable delays
//! - [`Biquad`]: second-order sections with cookbook low/high/band-pass designs
//! - [`SpectralProcessor`]: streaming STFT with perfect-reconstruction overlap-add
//! - [`Kernel`] and [`Convolver`]: uniform overlap-add FFT convolution
//! - [`SmoothedParam`]: one-pole parameter smoothing
//! - Math: [`db_to_linear`], [`wet_dry_mix`], [`equal_power_pan`], [`Lcg`]
//!
//! # Example
//!
//! ```rust,ignore
//! use patchwire_core::{Graph, PortId};
//!
//! let mut graph = Graph::new(48000.0);
//! let src = graph.add(registry.create("oscillator", 48000.0)?);
//! let fx = graph.add(registry.create("reverb", 48000.0)?);
//! let out = graph.add(registry.create("endpoint", 48000.0)?);
//! graph.connect(PortId::output(src, 0), PortId::input(fx, 0))?;
//! graph.connect(PortId::output(fx, 0), PortId::input(out, 0))?;
//!
//! let block = graph.pull(out, 512);
//! ```

pub mod allpass;
pub mod biquad;
pub mod block;
pub mod buffer;
pub mod comb;
pub mod convolution;
pub mod delay;
pub mod engine;
pub mod error;
pub mod fft;
pub mod graph;
pub mod math;
pub mod module;
pub mod param;
pub mod port;
pub mod sample;
pub mod smooth;
pub mod stft;
pub mod worker;

pub use allpass::AllpassFilter;
pub use biquad::{Biquad, BiquadCoefficients};
pub use block::{Block, CueTrigger, DataType, EventBlock, MidiEvent};
pub use buffer::StereoBuffer;
pub use comb::CombFilter;
pub use convolution::{Convolver, Kernel};
pub use delay::DelayLine;
pub use engine::{Engine, EngineHandle};
pub use error::{GraphError, IneligibleReason, ModuleError};
pub use fft::{Fft, Window};
pub use graph::{Connection, Graph, ModuleId, PortIo, Removal, TypeMismatch};
pub use math::{
    Lcg, db_to_linear, equal_power_pan, flush_denormal, linear_to_db, ms_to_samples, wet_dry_mix,
};
pub use module::{AsAny, Module, ModuleState};
pub use param::{ParamDescriptor, ParamStore, ParamUnit};
pub use port::{Direction, PortId, PortSpec};
pub use sample::{AssetSlot, SampleBuffer, SampleSlot};
pub use smooth::SmoothedParam;
pub use stft::SpectralProcessor;
pub use worker::BackgroundJob;
