use crate::block::{Block, DataType};
use crate::error::GraphError;
use crate::module::Module;
use crate::param::ParamStore;
use crate::port::{Direction, PortId, PortSpec};

use super::io::PortIo;
use super::node::{ModuleId, PortState, Slot};

/// A data-type mismatch carried by a successful connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatch {
    /// Type of the upstream output.
    pub output: DataType,
    /// Type of the downstream input.
    pub input: DataType,
}

/// The result of a successful [`Graph::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Upstream output port.
    pub output: PortId,
    /// Downstream input port.
    pub input: PortId,
    /// Set when the two ports carry different data types. The connection is
    /// live regardless; data is coerced to the input's type on receive.
    pub mismatch: Option<TypeMismatch>,
}

/// Arena of modules and the connections between their ports.
///
/// See the [module docs](super) for the evaluation model.
pub struct Graph {
    slots: Vec<Option<Slot>>,
    sample_rate: f32,
}

impl Graph {
    /// Creates an empty graph running at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            slots: Vec::new(),
            sample_rate,
        }
    }

    /// Sample rate passed to every module on insertion.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Changes the sample rate of the graph and every module in it.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for slot in self.slots.iter_mut().flatten() {
            if let Some(module) = slot.module.as_mut() {
                module.set_sample_rate(sample_rate);
            }
        }
    }

    /// Resets DSP state of every module.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            if let Some(module) = slot.module.as_mut() {
                module.reset();
            }
        }
    }

    // --- Modules ---

    /// Adds a module and returns its id. Its ports start disconnected.
    pub fn add(&mut self, mut module: Box<dyn Module>) -> ModuleId {
        module.set_sample_rate(self.sample_rate);
        let id = ModuleId(self.slots.len() as u32);
        let kind = module.kind();
        self.slots.push(Some(Slot::new(module)));
        tracing::debug!("graph_add: {kind} {id}");
        id
    }

    /// Returns true if `id` refers to a live module.
    pub fn contains(&self, id: ModuleId) -> bool {
        self.slot(id).is_ok()
    }

    /// Number of live modules.
    pub fn module_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Ids of all live modules, in creation order.
    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| ModuleId(i as u32))
    }

    /// Ids of all sinks (modules with no outputs).
    pub fn sinks(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| s.outputs.is_empty()))
            .map(|(i, _)| ModuleId(i as u32))
    }

    /// Registry kind of a module.
    pub fn kind(&self, id: ModuleId) -> Option<&'static str> {
        self.slot(id).ok().map(|s| s.kind)
    }

    /// A clone of the module's parameter store, for the control thread.
    pub fn params(&self, id: ModuleId) -> Option<ParamStore> {
        self.slot(id).ok().map(|s| s.params.clone())
    }

    /// Shared access to a module.
    pub fn module(&self, id: ModuleId) -> Option<&dyn Module> {
        self.slot(id).ok().and_then(|s| s.module.as_deref())
    }

    /// Exclusive access to a module.
    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut dyn Module> {
        match self.slots.get_mut(id.0 as usize) {
            Some(Some(slot)) => match slot.module.as_mut() {
                Some(module) => Some(module.as_mut()),
                None => None,
            },
            _ => None,
        }
    }

    /// The module downcast to its concrete type.
    pub fn module_as<T: Module>(&self, id: ModuleId) -> Option<&T> {
        self.module(id).and_then(|m| m.as_any().downcast_ref::<T>())
    }

    /// The module downcast to its concrete type, mutably.
    pub fn module_as_mut<T: Module>(&mut self, id: ModuleId) -> Option<&mut T> {
        self.module_mut(id)
            .and_then(|m| m.as_any_mut().downcast_mut::<T>())
    }

    /// Takes a module's slot out of the arena. Callers disconnect first.
    pub(crate) fn take_slot(&mut self, id: ModuleId) -> Option<Slot> {
        self.slots.get_mut(id.0 as usize).and_then(Option::take)
    }

    // --- Ports ---

    /// Input port schema of a module.
    pub fn inputs(&self, id: ModuleId) -> Result<Vec<PortSpec>, GraphError> {
        Ok(self.slot(id)?.inputs.iter().map(|p| p.spec).collect())
    }

    /// Output port schema of a module.
    pub fn outputs(&self, id: ModuleId) -> Result<Vec<PortSpec>, GraphError> {
        Ok(self.slot(id)?.outputs.iter().map(|p| p.spec).collect())
    }

    /// The schema entry for a port.
    pub fn port_spec(&self, port: PortId) -> Result<PortSpec, GraphError> {
        Ok(self.port(port)?.spec)
    }

    /// The port on the other end of `port`'s connection, if any.
    pub fn peer(&self, port: PortId) -> Option<PortId> {
        self.port(port).ok().and_then(|p| p.peer)
    }

    /// Returns true if `port` is connected.
    pub fn is_connected(&self, port: PortId) -> bool {
        self.peer(port).is_some()
    }

    /// Number of connected outputs on a module.
    pub fn connected_outputs(&self, id: ModuleId) -> usize {
        self.slot(id)
            .map_or(0, |s| s.outputs.iter().filter(|p| p.peer.is_some()).count())
    }

    /// Every live connection as `(output, input)` pairs, in module order.
    pub fn connections(&self) -> Vec<(PortId, PortId)> {
        let mut out = Vec::new();
        for id in self.module_ids() {
            if let Ok(slot) = self.slot(id) {
                for (index, port) in slot.outputs.iter().enumerate() {
                    if let Some(peer) = port.peer {
                        out.push((PortId::output(id, index), peer));
                    }
                }
            }
        }
        out
    }

    // --- Connections ---

    /// Connects an output and an input, in either argument order.
    ///
    /// Any existing connection on either port is torn down first. Ports of
    /// different data types connect anyway; the returned [`Connection`]
    /// reports the mismatch and a warning is logged.
    ///
    /// # Errors
    ///
    /// [`GraphError::Direction`] if both ports have the same direction; the
    /// graph is unchanged. Missing modules or ports are also rejected.
    pub fn connect(&mut self, a: PortId, b: PortId) -> Result<Connection, GraphError> {
        if a.direction == b.direction {
            return Err(GraphError::Direction {
                a,
                b,
                direction: a.direction,
            });
        }
        let (output, input) = if a.direction == Direction::Output {
            (a, b)
        } else {
            (b, a)
        };
        let output_type = self.port(output)?.spec.data_type;
        let input_type = self.port(input)?.spec.data_type;

        self.disconnect(output)?;
        self.disconnect(input)?;
        self.port_mut(output)?.peer = Some(input);
        let input_state = self.port_mut(input)?;
        input_state.peer = Some(output);
        input_state.cue_level = 0.0;

        let mismatch = (output_type != input_type).then(|| {
            tracing::warn!(
                "type mismatch: {output} ({output_type}) → {input} ({input_type}); data will be coerced"
            );
            TypeMismatch {
                output: output_type,
                input: input_type,
            }
        });
        tracing::debug!("graph_connect: {output} → {input}");
        Ok(Connection {
            output,
            input,
            mismatch,
        })
    }

    /// Like [`connect`](Self::connect), but refuses connections that would
    /// close a cycle.
    pub fn connect_acyclic(&mut self, a: PortId, b: PortId) -> Result<Connection, GraphError> {
        let (output, input) = if a.direction == Direction::Output {
            (a, b)
        } else {
            (b, a)
        };
        if a.direction != b.direction {
            self.port(output)?;
            self.port(input)?;
            if self.depends_on(output.module, input.module) {
                return Err(GraphError::CycleDetected { output, input });
            }
        }
        self.connect(a, b)
    }

    /// Disconnects `port`, clearing both sides. Idempotent.
    ///
    /// Returns the former peer, or `None` if the port was not connected.
    pub fn disconnect(&mut self, port: PortId) -> Result<Option<PortId>, GraphError> {
        let Some(peer) = self.port_mut(port)?.peer.take() else {
            return Ok(None);
        };
        if let Ok(other) = self.port_mut(peer) {
            if other.peer == Some(port) {
                other.peer = None;
            }
        }
        tracing::debug!("graph_disconnect: {port} / {peer}");
        Ok(Some(peer))
    }

    /// Disconnects every port of a module.
    pub fn disconnect_all(&mut self, id: ModuleId) -> Result<(), GraphError> {
        let slot = self.slot(id)?;
        let (n_in, n_out) = (slot.inputs.len(), slot.outputs.len());
        for index in 0..n_in {
            self.disconnect(PortId::input(id, index))?;
        }
        for index in 0..n_out {
            self.disconnect(PortId::output(id, index))?;
        }
        Ok(())
    }

    /// Returns true if `from` transitively pulls from `target`, or is `target`.
    fn depends_on(&self, from: ModuleId, target: ModuleId) -> bool {
        let mut visited = vec![false; self.slots.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            let idx = current.0 as usize;
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;
            if let Ok(slot) = self.slot(current) {
                stack.extend(slot.inputs.iter().filter_map(|p| p.peer).map(|p| p.module));
            }
        }
        false
    }

    // --- Evaluation ---

    /// Returns `frames` frames arriving at `input`.
    ///
    /// Unconnected inputs yield the default block of their type. Blocks from
    /// an output of a different type are coerced to the input's type.
    pub fn receive(&mut self, input: PortId, frames: usize) -> Block {
        let Ok(state) = self.port(input) else {
            tracing::warn!("receive on missing port {input}");
            return Block::silence(DataType::Audio, frames);
        };
        let (data_type, peer, level) = (state.spec.data_type, state.peer, state.cue_level);
        let Some(peer) = peer else {
            return Block::silence(data_type, frames);
        };
        let block = self.send(peer, frames);
        if data_type != DataType::Cue || !block.data_type().is_sampled() {
            return block.coerce_to(data_type);
        }
        let (cues, level) = block.into_cues_from(level);
        if let Ok(state) = self.port_mut(input) {
            state.cue_level = level;
        }
        Block::Cue(cues)
    }

    /// Returns `frames` frames produced at `output`.
    ///
    /// Unconnected outputs yield the default block without running the
    /// module. Connected outputs run the owner's `generate_port` every time;
    /// nothing is cached.
    pub fn send(&mut self, output: PortId, frames: usize) -> Block {
        let Ok(state) = self.port(output) else {
            tracing::warn!("send on missing port {output}");
            return Block::silence(DataType::Audio, frames);
        };
        let data_type = state.spec.data_type;
        if state.peer.is_none() {
            return Block::silence(data_type, frames);
        }
        self.run(output.module, Some(output.index), frames, data_type)
    }

    /// Evaluates a module's primary output, normally a sink's final audio.
    ///
    /// The device callback calls this once per sink per block.
    pub fn pull(&mut self, id: ModuleId, frames: usize) -> Block {
        let data_type = self
            .slot(id)
            .ok()
            .and_then(|s| s.outputs.first())
            .map_or(DataType::Audio, |p| p.spec.data_type);
        self.run(id, None, frames, data_type)
    }

    fn run(
        &mut self,
        id: ModuleId,
        output: Option<usize>,
        frames: usize,
        fallback: DataType,
    ) -> Block {
        let Some(Some(slot)) = self.slots.get_mut(id.0 as usize) else {
            return Block::silence(fallback, frames);
        };
        let kind = slot.kind;
        let Some(mut module) = slot.module.take() else {
            tracing::error!("re-entrant pull of {kind} {id}: the graph contains a cycle");
            return Block::silence(fallback, frames);
        };

        let result = {
            let mut io = PortIo::new(self, id);
            match output {
                Some(index) => module.generate_port(index, frames, &mut io),
                None => module.generate(frames, &mut io),
            }
        };

        if let Some(Some(slot)) = self.slots.get_mut(id.0 as usize) {
            slot.module = Some(module);
        }

        match result {
            Ok(block) => block.conform(frames),
            Err(err) => {
                tracing::error!("{kind} {id} failed, substituting silence: {err}");
                Block::silence(fallback, frames)
            }
        }
    }

    // --- Internal lookups ---

    pub(crate) fn slot(&self, id: ModuleId) -> Result<&Slot, GraphError> {
        self.slots
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(GraphError::ModuleNotFound(id))
    }

    fn port(&self, port: PortId) -> Result<&PortState, GraphError> {
        let slot = self.slot(port.module)?;
        let ports = match port.direction {
            Direction::Input => &slot.inputs,
            Direction::Output => &slot.outputs,
        };
        ports.get(port.index).ok_or(GraphError::PortOutOfRange(port))
    }

    fn port_mut(&mut self, port: PortId) -> Result<&mut PortState, GraphError> {
        let slot = self
            .slots
            .get_mut(port.module.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::ModuleNotFound(port.module))?;
        let ports = match port.direction {
            Direction::Input => &mut slot.inputs,
            Direction::Output => &mut slot.outputs,
        };
        ports.get_mut(port.index).ok_or(GraphError::PortOutOfRange(port))
    }
}
