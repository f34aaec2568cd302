//! Property-based tests for patchwire-modules.
//!
//! Covers sample preservation under chunk shuffling, normalizer peak
//! targeting, reverb stability across room changes and spectral frame
//! counts for arbitrary block sizes.

use proptest::prelude::*;
use patchwire_core::{
    Block, Graph, Module, ModuleError, ModuleId, ParamStore, PortId, PortIo, PortSpec, StereoBuffer,
};
use patchwire_modules::{Formant, Normalize, Reverb, Shuffle};

const OUT: [PortSpec; 1] = [PortSpec::audio("audio")];

/// Emits the same fixed samples on every pull.
struct Feed {
    samples: Vec<f32>,
    params: ParamStore,
}

impl Module for Feed {
    fn kind(&self) -> &'static str {
        "feed"
    }
    fn inputs(&self) -> &[PortSpec] {
        &[]
    }
    fn outputs(&self) -> &[PortSpec] {
        &OUT
    }
    fn params(&self) -> &ParamStore {
        &self.params
    }
    fn generate(&mut self, frames: usize, _io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
        let mut samples = self.samples.clone();
        samples.resize(frames, 0.0);
        Ok(Block::Audio(StereoBuffer::from_mono(&samples)))
    }
}

fn feed_into(graph: &mut Graph, samples: Vec<f32>, module: Box<dyn Module>) -> ModuleId {
    let source = graph.add(Box::new(Feed {
        samples,
        params: ParamStore::empty(),
    }));
    let id = graph.add(module);
    graph
        .connect(PortId::output(source, 0), PortId::input(id, 0))
        .unwrap();
    id
}

fn sorted(mut v: Vec<f32>) -> Vec<f32> {
    v.sort_by(f32::total_cmp);
    v
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Shuffling only moves samples around.
    #[test]
    fn shuffle_preserves_samples(
        samples in prop::collection::vec(-1.0f32..=1.0, 0..3000),
        chunk in 16.0f32..=512.0,
        intensity in 0.0f32..=1.0,
        blocks in 1usize..4,
    ) {
        let mut graph = Graph::new(48000.0);
        let id = feed_into(&mut graph, samples.clone(), Box::new(Shuffle::new(48000.0)));
        let params = graph.params(id).unwrap();
        params.set(Shuffle::CHUNK, chunk);
        params.set(Shuffle::INTENSITY, intensity);
        for _ in 0..blocks {
            let out = graph.pull(id, samples.len()).into_audio();
            prop_assert_eq!(out.len(), samples.len());
            prop_assert_eq!(sorted(out.left.clone()), sorted(samples.clone()));
            prop_assert_eq!(out.left, out.right);
        }
    }

    /// A non-silent block leaves the normalizer with exactly the target peak.
    #[test]
    fn normalize_hits_target(
        samples in prop::collection::vec(-1.0f32..=1.0, 1..500),
        target in 0.0f32..=1.0,
    ) {
        let peak = samples.iter().fold(0.0f32, |m, x| m.max(x.abs()));
        prop_assume!(peak > 1e-3);
        let mut graph = Graph::new(48000.0);
        let id = feed_into(&mut graph, samples.clone(), Box::new(Normalize::new(48000.0)));
        graph.params(id).unwrap().set(Normalize::TARGET, target);
        let out = graph.pull(id, samples.len()).into_audio();
        prop_assert!((out.peak() - target).abs() < 1e-4);
    }

    /// Reverb output stays finite and sized while the room changes, and the
    /// comb lines never shrink.
    #[test]
    fn reverb_stable_under_room_changes(
        steps in prop::collection::vec((1usize..2048, 0.0f32..=1.0), 1..12),
        sample_rate in prop::sample::select(vec![22050.0f32, 44100.0, 48000.0, 96000.0]),
    ) {
        let mut graph = Graph::new(sample_rate);
        let impulse = {
            let mut v = vec![0.0; 64];
            v[0] = 1.0;
            v
        };
        let id = feed_into(&mut graph, impulse, Box::new(Reverb::new(sample_rate)));
        let params = graph.params(id).unwrap();
        params.set(Reverb::DECAY, 0.95);
        let mut last = graph.module_as::<Reverb>(id).unwrap().comb_capacities(0);
        for (frames, room) in steps {
            params.set(Reverb::ROOM, room);
            let out = graph.pull(id, frames).into_audio();
            prop_assert_eq!(out.len(), frames);
            prop_assert!(out.left.iter().chain(&out.right).all(|x| x.is_finite()));
            let caps = graph.module_as::<Reverb>(id).unwrap().comb_capacities(0);
            for (now, before) in caps.iter().zip(&last) {
                prop_assert!(now >= before);
            }
            last = caps;
        }
    }

    /// The formant shifter returns the requested frame count for any ratio.
    #[test]
    fn formant_returns_requested_frames(
        ratio in 0.25f32..=4.0,
        sizes in prop::collection::vec(0usize..3000, 1..6),
    ) {
        let samples: Vec<f32> = (0..3000).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let mut graph = Graph::new(48000.0);
        let id = feed_into(&mut graph, samples, Box::new(Formant::new(48000.0)));
        graph.params(id).unwrap().set(Formant::RATIO, ratio);
        for frames in sizes {
            let out = graph.pull(id, frames).into_audio();
            prop_assert_eq!(out.len(), frames);
            prop_assert!(out.left.iter().all(|x| x.is_finite()));
        }
    }
}
