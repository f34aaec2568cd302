//! Reverse delay.

use patchwire_core::{
    Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec, StereoBuffer,
    wet_dry_mix,
};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Plays the last `delay` window backwards.
///
/// A circular buffer of `sr·ms/1000` frames is written forward at `w`, then
/// read at `size - 1 - w`, so the read head sweeps the buffer in the
/// opposite direction. Changing the delay resizes the buffer in place,
/// keeping whatever it already holds.
///
/// # Parameters
///
/// - `delay_ms`: 100-2000 ms (default 500)
/// - `mix`: 0.0-1.0 (default 0.5)
pub struct ReverseDelay {
    buffers: [Vec<f32>; 2],
    write: usize,
    sample_rate: f32,
    params: ParamStore,
}

impl ReverseDelay {
    /// Delay window in milliseconds.
    pub const DELAY: usize = 0;
    /// Dry/wet mix.
    pub const MIX: usize = 1;

    /// Creates a 500 ms reverse delay.
    pub fn new(sample_rate: f32) -> Self {
        let params = ParamStore::new(vec![
            ParamDescriptor::time_ms("Delay", "delay_ms", 100.0, 2000.0, 500.0),
            ParamDescriptor::mix().with_default(0.5),
        ]);
        let size = Self::size_for(params.get(Self::DELAY), sample_rate);
        Self {
            buffers: [vec![0.0; size], vec![0.0; size]],
            write: 0,
            sample_rate,
            params,
        }
    }

    fn size_for(ms: f32, sample_rate: f32) -> usize {
        ((sample_rate * ms / 1000.0) as usize).max(1)
    }

    /// Current buffer length in frames.
    pub fn buffer_len(&self) -> usize {
        self.buffers[0].len()
    }

    fn resize(&mut self, size: usize) {
        if size == self.buffer_len() {
            return;
        }
        for buf in &mut self.buffers {
            buf.resize(size, 0.0);
        }
        self.write %= size;
    }
}

impl Module for ReverseDelay {
    fn kind(&self) -> &'static str {
        "reverse_delay"
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
        self.resize(Self::size_for(self.params.get(Self::DELAY), self.sample_rate));
        let mix = self.params.get(Self::MIX);

        let size = self.buffer_len();
        let mut out = StereoBuffer::new(frames);
        for i in 0..frames {
            let (xl, xr) = input.frame(i);
            let [bl, br] = &mut self.buffers;
            bl[self.write] = xl;
            br[self.write] = xr;
            // Written first: at the midpoint of an odd-sized buffer the read
            // head lands on the current frame.
            let read = size - 1 - self.write;
            out.left[i] = wet_dry_mix(xl, bl[read], mix);
            out.right[i] = wet_dry_mix(xr, br[read], mix);
            self.write = (self.write + 1) % size;
        }
        Ok(Block::Audio(out))
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.resize(Self::size_for(self.params.get(Self::DELAY), sample_rate));
    }

    fn reset(&mut self) {
        for buf in &mut self.buffers {
            buf.fill(0.0);
        }
        self.write = 0;
    }
}
