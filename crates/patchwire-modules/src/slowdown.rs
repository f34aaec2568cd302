//! Block-rate time warping.

use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, StereoBuffer,
};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Speeds up or stalls its upstream by pulling it more or less than once per block.
///
/// With a negative interval `-N` every block pulls the input `N` times and
/// keeps only the last result, so stateful sources run `N` times faster.
/// With a positive interval `N` the input is pulled once every `N` blocks
/// and the cached block is repeated in between. Zero passes through.
///
/// # Parameters
///
/// - `interval`: -5 to 5, whole steps (default 0)
pub struct Slowdown {
    cached: Option<StereoBuffer>,
    counter: i32,
    params: ParamStore,
}

impl Slowdown {
    /// Frame interval.
    pub const INTERVAL: usize = 0;

    /// Creates a passthrough slowdown.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            cached: None,
            counter: 0,
            params: ParamStore::new(vec![
                ParamDescriptor::custom("Frame Interval", "interval", -5.0, 5.0, 0.0)
                    .with_step(1.0)
                    .with_short_name("Interval"),
            ]),
        }
    }
}

impl Module for Slowdown {
    fn kind(&self) -> &'static str {
        "slowdown"
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
        let interval = self.params.get(Self::INTERVAL).round() as i32;
        match interval {
            0 => {
                self.cached = None;
                Ok(Block::Audio(io.receive_audio(0, frames)))
            }
            n if n < 0 => {
                self.cached = None;
                let mut block = io.receive_audio(0, frames);
                for _ in 1..n.unsigned_abs() {
                    block = io.receive_audio(0, frames);
                }
                Ok(Block::Audio(block))
            }
            n => {
                self.counter += 1;
                let stale = self.cached.as_ref().is_none_or(|c| c.len() != frames);
                if stale || self.counter >= n {
                    self.counter = 0;
                    self.cached = Some(io.receive_audio(0, frames));
                }
                Ok(Block::Audio(self.cached.clone().unwrap_or_else(|| StereoBuffer::new(frames))))
            }
        }
    }

    fn reset(&mut self) {
        self.cached = None;
        self.counter = 0;
    }
}
