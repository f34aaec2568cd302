//! Arena slots and per-port connection state.

use serde::{Deserialize, Serialize};

use crate::module::Module;
use crate::param::ParamStore;
use crate::port::{PortId, PortSpec};

/// Unique identifier for a module in a [`Graph`](super::Graph).
///
/// Ids are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub(crate) u32);

impl ModuleId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

/// Schema entry plus the current peer, if connected.
pub(crate) struct PortState {
    pub spec: PortSpec,
    pub peer: Option<PortId>,
    /// Last sampled level seen by a cue input fed from a sampled output.
    pub cue_level: f32,
}

impl PortState {
    fn new(spec: PortSpec) -> Self {
        Self {
            spec,
            peer: None,
            cue_level: 0.0,
        }
    }
}

pub(crate) struct Slot {
    pub kind: &'static str,
    /// `None` only while the module is inside its own `generate`.
    pub module: Option<Box<dyn Module>>,
    pub params: ParamStore,
    pub inputs: Vec<PortState>,
    pub outputs: Vec<PortState>,
}

impl Slot {
    pub fn new(module: Box<dyn Module>) -> Self {
        Self {
            kind: module.kind(),
            params: module.params().clone(),
            inputs: module.inputs().iter().copied().map(PortState::new).collect(),
            outputs: module.outputs().iter().copied().map(PortState::new).collect(),
            module: Some(module),
        }
    }

    pub fn has_connections(&self) -> bool {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .any(|p| p.peer.is_some())
    }
}
