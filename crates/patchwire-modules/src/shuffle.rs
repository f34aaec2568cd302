//! Chunk shuffler.

use patchwire_core::{
    Block, Lcg, Module, ModuleError, ParamDescriptor, ParamStore, ParamUnit, PortIo, PortSpec,
};

const PORTS: [PortSpec; 1] = [PortSpec::audio("audio")];

const MIN_CHUNK: usize = 16;
const MAX_CHUNK: usize = 4096;

/// Nearest power of two within the chunk range.
fn chunk_size(value: f32) -> usize {
    let exp = libm::roundf(libm::log2f(value.max(1.0)));
    (1_usize << exp as u32).clamp(MIN_CHUNK, MAX_CHUNK)
}

/// Reorders whole chunks within each block.
///
/// The block is cut into `frames / chunk` chunks. `max(2, round(n·intensity))`
/// of them are picked at random and permuted among themselves; the rest,
/// and any partial chunk at the end, stay in place. Blocks holding fewer
/// than two chunks pass through.
///
/// # Parameters
///
/// - `chunk`: 16-4096 samples, snapped to a power of two (default 512)
/// - `intensity`: 0.0-1.0 share of chunks moved (default 1.0)
/// - `enabled`: on/off (default on)
pub struct Shuffle {
    rng: Lcg,
    order: Vec<usize>,
    pool: Vec<usize>,
    slots: Vec<usize>,
    params: ParamStore,
}

impl Shuffle {
    /// Chunk size in samples.
    pub const CHUNK: usize = 0;
    /// Share of chunks moved.
    pub const INTENSITY: usize = 1;
    /// Enable switch.
    pub const ENABLED: usize = 2;

    /// Creates a shuffler at the default settings.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            rng: Lcg::default(),
            order: Vec::with_capacity(64),
            pool: Vec::with_capacity(64),
            slots: Vec::with_capacity(64),
            params: ParamStore::new(vec![
                ParamDescriptor::custom("Chunk Size", "chunk", 16.0, 4096.0, 512.0)
                    .with_unit(ParamUnit::Samples)
                    .with_short_name("Chunk"),
                ParamDescriptor::custom("Intensity", "intensity", 0.0, 1.0, 1.0),
                ParamDescriptor::toggle("Enabled", "enabled", true),
            ]),
        }
    }

    /// Fills `order` so that output chunk `i` comes from input chunk `order[i]`.
    fn plan(&mut self, chunks: usize, moved: usize) {
        self.order.clear();
        self.order.extend(0..chunks);

        // Partial Fisher-Yates: the first `moved` entries become a random subset.
        self.pool.clear();
        self.pool.extend(0..chunks);
        for i in 0..moved {
            let j = i + self.rng.next_below(chunks - i);
            self.pool.swap(i, j);
        }
        self.pool.truncate(moved);

        // Permute the picked chunks among their own slots.
        let Self {
            order,
            pool,
            slots,
            rng,
            ..
        } = self;
        slots.clear();
        slots.extend_from_slice(pool);
        for i in (1..pool.len()).rev() {
            let j = rng.next_below(i + 1);
            pool.swap(i, j);
        }
        for (slot, source) in slots.iter().zip(pool.iter()) {
            order[*slot] = *source;
        }
    }
}

impl Module for Shuffle {
    fn kind(&self) -> &'static str {
        "shuffle"
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
        let intensity = self.params.get(Self::INTENSITY);
        let chunk = chunk_size(self.params.get(Self::CHUNK));
        let chunks = frames / chunk;
        if !self.params.get_bool(Self::ENABLED) || intensity <= 0.0 || chunks < 2 {
            return Ok(Block::Audio(input));
        }

        let moved = ((chunks as f32 * intensity).round() as usize).clamp(2, chunks);
        self.plan(chunks, moved);

        let mut out = input.clone();
        for (dst, &src) in self.order.iter().enumerate() {
            if dst == src {
                continue;
            }
            let (to, from) = (dst * chunk, src * chunk);
            out.left[to..to + chunk].copy_from_slice(&input.left[from..from + chunk]);
            out.right[to..to + chunk].copy_from_slice(&input.right[from..from + chunk]);
        }
        Ok(Block::Audio(out))
    }

    fn reset(&mut self) {
        self.rng = Lcg::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Signal, wire};
    use patchwire_core::{Graph, StereoBuffer};

    /// Input chunk that output chunk `index` came from, for a ramp input.
    fn source_chunk(out: &StereoBuffer, chunk: usize, index: usize) -> usize {
        (out.left[index * chunk] / chunk as f32) as usize
    }

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_chunk_snaps_to_power_of_two() {
        assert_eq!(chunk_size(512.0), 512);
        assert_eq!(chunk_size(700.0), 512);
        assert_eq!(chunk_size(800.0), 1024);
        assert_eq!(chunk_size(3.0), MIN_CHUNK);
    }

    #[test]
    fn test_full_shuffle_is_permutation() {
        let mut graph = Graph::new(48000.0);
        let id = wire(&mut graph, Signal::boxed(ramp(1040)), Box::new(Shuffle::new(48000.0)));
        graph.params(id).unwrap().set(Shuffle::CHUNK, 64.0);
        let out = graph.pull(id, 1040).into_audio();

        let mut sources: Vec<usize> = (0..16).map(|i| source_chunk(&out, 64, i)).collect();
        // Chunks move intact.
        for i in 0..16 {
            let src = sources[i];
            for k in 0..64 {
                assert_eq!(out.left[i * 64 + k], (src * 64 + k) as f32);
            }
        }
        assert_ne!(sources, (0..16).collect::<Vec<_>>());
        sources.sort_unstable();
        assert_eq!(sources, (0..16).collect::<Vec<_>>());
        // The partial chunk at the end stays put.
        assert_eq!(&out.left[1024..], &ramp(1040)[1024..]);
    }

    #[test]
    fn test_low_intensity_moves_few_chunks() {
        let mut graph = Graph::new(48000.0);
        let id = wire(&mut graph, Signal::boxed(ramp(1024)), Box::new(Shuffle::new(48000.0)));
        let params = graph.params(id).unwrap();
        params.set(Shuffle::CHUNK, 16.0);
        params.set(Shuffle::INTENSITY, 0.05);
        let out = graph.pull(id, 1024).into_audio();
        let displaced = (0..64).filter(|&i| source_chunk(&out, 16, i) != i).count();
        assert!(displaced <= 3, "moved {displaced}");
    }

    #[test]
    fn test_disabled_and_small_blocks_pass() {
        let mut graph = Graph::new(48000.0);
        let id = wire(&mut graph, Signal::boxed(ramp(2048)), Box::new(Shuffle::new(48000.0)));
        assert_eq!(graph.pull(id, 600).into_audio().left, ramp(600));
        graph.params(id).unwrap().set_bool(Shuffle::ENABLED, false);
        assert_eq!(graph.pull(id, 1024).into_audio().left, ramp(1624)[600..].to_vec());
    }
}
