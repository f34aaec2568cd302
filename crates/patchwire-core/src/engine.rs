//! Device-callback driver for a shared graph.
//!
//! [`Engine`] lives on the audio thread and owns the callback body:
//! [`render`](Engine::render) pulls every sink once, sums the results into
//! the device buffer and hard-clips to ±1. [`EngineHandle`] is the control
//! thread's side, used for structural edits.
//!
//! The graph sits behind a `parking_lot::Mutex`, but the audio thread only
//! ever `try_lock`s it. If an edit is in progress the block is rendered as
//! silence and the callback returns immediately. It never waits on the
//! control thread. Parameter changes do not need the lock at all: they go
//! through the modules' [`ParamStore`](crate::ParamStore) clones.
//!
//! ```rust,ignore
//! let mut engine = Engine::new(graph);
//! let handle = engine.handle();
//! handle.edit(|g| g.connect(a, b))?;
//! engine.render(&mut device_buffer);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::StereoBuffer;
use crate::graph::{Graph, ModuleId};

/// Control-thread handle to an engine's graph.
#[derive(Clone)]
pub struct EngineHandle {
    graph: Arc<Mutex<Graph>>,
}

impl EngineHandle {
    /// Runs `f` with exclusive access to the graph.
    ///
    /// Blocks the caller (never the audio thread) until the graph is free.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
        f(&mut self.graph.lock())
    }
}

/// Audio-thread renderer.
pub struct Engine {
    graph: Arc<Mutex<Graph>>,
    sinks: Vec<ModuleId>,
    skipped_blocks: u64,
}

impl Engine {
    /// Wraps a graph for rendering.
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: Arc::new(Mutex::new(graph)),
            sinks: Vec::with_capacity(16),
            skipped_blocks: 0,
        }
    }

    /// A handle for the control thread.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            graph: Arc::clone(&self.graph),
        }
    }

    /// Runs `f` with exclusive access to the graph, as [`EngineHandle::edit`] does.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
        f(&mut self.graph.lock())
    }

    /// Number of blocks rendered as silence because an edit held the graph.
    pub fn skipped_blocks(&self) -> u64 {
        self.skipped_blocks
    }

    /// Renders one block of `out.len()` frames.
    ///
    /// Returns false when the graph was busy and `out` was filled with silence.
    pub fn render(&mut self, out: &mut StereoBuffer) -> bool {
        out.clear();
        let Self {
            graph,
            sinks,
            skipped_blocks,
        } = self;
        let Some(mut graph) = graph.try_lock() else {
            *skipped_blocks += 1;
            tracing::trace!("graph busy, rendering silence");
            return false;
        };

        let frames = out.len();
        sinks.clear();
        sinks.extend(graph.sinks());
        for &sink in sinks.iter() {
            let block = graph.pull(sink, frames).into_audio();
            out.accumulate_from(&block);
        }
        out.clip(1.0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::error::ModuleError;
    use crate::graph::PortIo;
    use crate::module::Module;
    use crate::param::ParamStore;
    use crate::port::PortSpec;

    const IN: [PortSpec; 1] = [PortSpec::audio("audio")];

    struct Dc {
        level: f32,
        params: ParamStore,
    }

    impl Module for Dc {
        fn kind(&self) -> &'static str {
            "dc"
        }
        fn inputs(&self) -> &[PortSpec] {
            &[]
        }
        fn outputs(&self) -> &[PortSpec] {
            &[]
        }
        fn params(&self) -> &ParamStore {
            &self.params
        }
        fn generate(&mut self, frames: usize, _io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
            Ok(Block::Audio(StereoBuffer::from_mono(&vec![self.level; frames])))
        }
    }

    struct Tap {
        params: ParamStore,
    }

    impl Module for Tap {
        fn kind(&self) -> &'static str {
            "tap"
        }
        fn inputs(&self) -> &[PortSpec] {
            &IN
        }
        fn outputs(&self) -> &[PortSpec] {
            &[]
        }
        fn params(&self) -> &ParamStore {
            &self.params
        }
        fn generate(&mut self, frames: usize, io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
            Ok(io.receive(0, frames))
        }
    }

    fn dc(level: f32) -> Box<dyn Module> {
        Box::new(Dc {
            level,
            params: ParamStore::empty(),
        })
    }

    #[test]
    fn test_render_sums_and_clips() {
        let mut graph = Graph::new(48000.0);
        graph.add(dc(0.4));
        graph.add(dc(0.4));
        let mut engine = Engine::new(graph);
        let mut out = StereoBuffer::new(32);
        assert!(engine.render(&mut out));
        assert!((out.left[0] - 0.8).abs() < 1e-6);

        engine.handle().edit(|g| g.add(dc(0.5)));
        engine.render(&mut out);
        assert_eq!(out.left[5], 1.0);
    }

    #[test]
    fn test_busy_graph_renders_silence() {
        let mut graph = Graph::new(48000.0);
        graph.add(dc(0.4));
        let mut engine = Engine::new(graph);
        let handle = engine.handle();
        let guard = handle.graph.lock();
        let mut out = StereoBuffer::from_mono(&[1.0; 16]);
        assert!(!engine.render(&mut out));
        assert_eq!(out.peak(), 0.0);
        assert_eq!(engine.skipped_blocks(), 1);
        drop(guard);
        assert!(engine.render(&mut out));
    }

    #[test]
    fn test_unconnected_sink_is_silent() {
        let mut graph = Graph::new(48000.0);
        graph.add(Box::new(Tap {
            params: ParamStore::empty(),
        }));
        let mut engine = Engine::new(graph);
        let mut out = StereoBuffer::new(8);
        assert!(engine.render(&mut out));
        assert_eq!(out.peak(), 0.0);
    }
}
