//! Patch documents: a saved graph of modules, their state and connections.

use std::collections::BTreeMap;
use std::path::Path;

use patchwire_core::{Graph, ModuleId, ModuleState, PortId};
use patchwire_registry::ModuleRegistry;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, write_with_parents};

/// One module in a patch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchModule {
    /// Id within the patch. Stable only inside this document.
    pub id: u32,
    /// Registry kind.
    pub kind: String,
    /// The module's own serialized state (parameters by string id, plus any
    /// extra keys the module writes).
    #[serde(default)]
    pub state: ModuleState,
}

/// One end of a saved connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchPort {
    /// Patch id of the module.
    pub module: u32,
    /// Port index on that module.
    pub port: usize,
}

/// A saved output-to-input connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchConnection {
    /// Upstream output.
    pub from: PatchPort,
    /// Downstream input.
    pub to: PatchPort,
}

/// A serializable snapshot of a [`Graph`].
///
/// Sample data and impulse responses are never part of a patch; players
/// and convolvers come back empty and must be loaded again.
///
/// # TOML Format
///
/// ```toml
/// name = "tone"
///
/// [[modules]]
/// id = 0
/// kind = "oscillator"
/// [modules.state]
/// frequency = 220.0
///
/// [[modules]]
/// id = 1
/// kind = "endpoint"
///
/// [[connections]]
/// from = { module = 0, port = 0 }
/// to = { module = 1, port = 0 }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Patch {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Modules by patch id.
    #[serde(default)]
    pub modules: Vec<PatchModule>,
    /// Connections between them.
    #[serde(default)]
    pub connections: Vec<PatchConnection>,
}

impl Patch {
    /// Create an empty patch.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Snapshots every module and connection in `graph`.
    ///
    /// Patch ids are the graph's own module indices.
    pub fn capture(graph: &Graph) -> Self {
        let modules = graph
            .module_ids()
            .filter_map(|id| {
                let module = graph.module(id)?;
                Some(PatchModule {
                    id: id.index(),
                    kind: module.kind().to_string(),
                    state: module.serialize(),
                })
            })
            .collect();
        let connections = graph
            .connections()
            .into_iter()
            .map(|(output, input)| PatchConnection {
                from: PatchPort {
                    module: output.module.index(),
                    port: output.index,
                },
                to: PatchPort {
                    module: input.module.index(),
                    port: input.index,
                },
            })
            .collect();
        Self {
            name: String::new(),
            modules,
            connections,
        }
    }

    /// Builds a new graph from this patch.
    ///
    /// Returns the graph and the mapping from patch ids to the new module
    /// ids. Fails on the first unknown kind, rejected state or bad
    /// connection.
    pub fn instantiate(
        &self,
        registry: &ModuleRegistry,
        sample_rate: f32,
    ) -> Result<(Graph, BTreeMap<u32, ModuleId>), ConfigError> {
        let mut graph = Graph::new(sample_rate);
        let mut ids = BTreeMap::new();
        for entry in &self.modules {
            let mut module = registry
                .create(&entry.kind, sample_rate)
                .ok_or_else(|| ConfigError::UnknownModule(entry.kind.clone()))?;
            module
                .deserialize(&entry.state)
                .map_err(|source| ConfigError::InvalidParameter {
                    id: entry.id,
                    kind: entry.kind.clone(),
                    source,
                })?;
            ids.insert(entry.id, graph.add(module));
        }

        let resolve = |module: u32| {
            ids.get(&module)
                .copied()
                .ok_or(ConfigError::DanglingConnection(module))
        };
        for connection in &self.connections {
            let output = PortId::output(resolve(connection.from.module)?, connection.from.port);
            let input = PortId::input(resolve(connection.to.module)?, connection.to.port);
            graph.connect(output, input)?;
        }
        tracing::debug!(
            modules = self.modules.len(),
            connections = self.connections.len(),
            "patch_instantiated"
        );
        Ok((graph, ids))
    }

    /// Load a patch from a file, as JSON if the extension is `.json` and
    /// TOML otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        if is_json(path) {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    /// Save a patch, choosing the format from the extension as [`load`](Self::load) does.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_json(path) {
            self.to_json()?
        } else {
            self.to_toml()?
        };
        write_with_parents(path, &content)
    }

    /// Parse a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Convert the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse a patch from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert the patch to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of modules in the patch.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True if the patch has no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwire_modules::{Endpoint, Oscillator, Player, Reverb};

    fn tone_graph() -> (Graph, ModuleId, ModuleId, ModuleId) {
        let mut graph = Graph::new(48000.0);
        let osc = graph.add(Box::new(Oscillator::new(48000.0)));
        let reverb = graph.add(Box::new(Reverb::new(48000.0)));
        let sink = graph.add(Box::new(Endpoint::new(48000.0)));
        graph.connect(PortId::output(osc, 0), PortId::input(reverb, 0)).unwrap();
        graph.connect(PortId::input(sink, 0), PortId::output(reverb, 0)).unwrap();
        (graph, osc, reverb, sink)
    }

    #[test]
    fn test_capture() {
        let (graph, osc, reverb, _) = tone_graph();
        graph.params(reverb).unwrap().set(Reverb::ROOM, 0.9);
        let patch = Patch::capture(&graph);
        assert_eq!(patch.len(), 3);
        assert_eq!(patch.modules[0].kind, "oscillator");
        assert_eq!(patch.modules[1].state["room"].as_f64(), Some(f64::from(0.9f32)));
        assert_eq!(patch.connections.len(), 2);
        assert_eq!(
            patch.connections[0],
            PatchConnection {
                from: PatchPort { module: osc.index(), port: 0 },
                to: PatchPort { module: reverb.index(), port: 0 },
            }
        );
    }

    #[test]
    fn test_instantiate_restores_state_and_wiring() {
        let (graph, osc, reverb, sink) = tone_graph();
        graph.params(osc).unwrap().set(Oscillator::FREQUENCY, 220.0);
        let patch = Patch::capture(&graph);

        let registry = ModuleRegistry::new();
        let (rebuilt, ids) = patch.instantiate(&registry, 48000.0).unwrap();
        assert_eq!(rebuilt.module_count(), 3);
        let new_osc = ids[&osc.index()];
        assert_eq!(rebuilt.params(new_osc).unwrap().get(Oscillator::FREQUENCY), 220.0);
        assert_eq!(
            rebuilt.peer(PortId::input(ids[&sink.index()], 0)),
            Some(PortId::output(ids[&reverb.index()], 0))
        );
    }

    #[test]
    fn test_player_playhead_survives() {
        let mut graph = Graph::new(48000.0);
        let player = graph.add(Box::new(Player::new(48000.0)));
        let mut patch = Patch::capture(&graph);
        patch.modules[0]
            .state
            .insert("playhead".to_string(), serde_json::Value::from(1234.5));

        let (rebuilt, ids) = patch
            .instantiate(&ModuleRegistry::new(), 48000.0)
            .unwrap();
        let restored = rebuilt.module_as::<Player>(ids[&player.index()]).unwrap();
        assert_eq!(restored.playhead(), 1234.5);
    }

    #[test]
    fn test_unknown_kind() {
        let mut patch = Patch::new("bad");
        patch.modules.push(PatchModule {
            id: 0,
            kind: "theremin".to_string(),
            state: ModuleState::new(),
        });
        let err = patch.instantiate(&ModuleRegistry::new(), 48000.0).err().unwrap();
        assert!(matches!(err, ConfigError::UnknownModule(ref k) if k == "theremin"));
    }

    #[test]
    fn test_invalid_state() {
        let mut state = ModuleState::new();
        state.insert("room".to_string(), serde_json::Value::from("huge"));
        let mut patch = Patch::new("bad");
        patch.modules.push(PatchModule {
            id: 7,
            kind: "reverb".to_string(),
            state,
        });
        let err = patch.instantiate(&ModuleRegistry::new(), 48000.0).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidParameter { id: 7, .. }));
    }

    #[test]
    fn test_dangling_connection() {
        let (graph, ..) = tone_graph();
        let mut patch = Patch::capture(&graph);
        patch.connections[0].from.module = 99;
        let err = patch.instantiate(&ModuleRegistry::new(), 48000.0).err().unwrap();
        assert!(matches!(err, ConfigError::DanglingConnection(99)));
    }

    #[test]
    fn test_toml_and_json_agree() {
        let (graph, ..) = tone_graph();
        let mut patch = Patch::capture(&graph);
        patch.name = "tone".to_string();
        let from_toml = Patch::from_toml(&patch.to_toml().unwrap()).unwrap();
        let from_json = Patch::from_json(&patch.to_json().unwrap()).unwrap();
        assert_eq!(from_toml.connections, patch.connections);
        assert_eq!(from_json, patch);
        assert_eq!(from_toml.modules.len(), 3);
        for (a, b) in from_toml.modules.iter().zip(&patch.modules) {
            assert_eq!(a.kind, b.kind);
            for (key, value) in &b.state {
                assert_eq!(a.state[key].as_f64(), value.as_f64(), "{key}");
            }
        }
    }
}
