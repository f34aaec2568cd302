//! Live editing: splicing a module into a connection and removing a module
//! while bridging its neighbours.

use crate::block::DataType;
use crate::error::{GraphError, IneligibleReason};
use crate::module::Module;
use crate::port::{Direction, PortId};

use super::node::ModuleId;
use super::processing::Graph;

/// Outcome of [`Graph::remove_module`].
pub struct Removal {
    /// The removed module, handed back to the caller.
    pub module: Option<Box<dyn Module>>,
    /// The `(upstream output, downstream input)` pair that was reconnected.
    pub bridged: Option<(PortId, PortId)>,
}

impl Graph {
    /// Splices `module` into the connection `output → input`.
    ///
    /// `module` must have an audio input and an audio output and no live
    /// connections. Afterwards `output` feeds the module's first audio input
    /// and its first audio output feeds `input`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InsertionIneligible`] if the module fails the checks above
    /// - [`GraphError::NotConnected`] if `output` does not feed `input`
    /// - [`GraphError::Direction`] if the ports are given the wrong way round
    ///
    /// In every error case the graph is left as it was.
    pub fn insert_module(
        &mut self,
        module: ModuleId,
        output: PortId,
        input: PortId,
    ) -> Result<(), GraphError> {
        if output.direction != Direction::Output || input.direction != Direction::Input {
            return Err(GraphError::Direction {
                a: output,
                b: input,
                direction: output.direction,
            });
        }
        if self.peer(output) != Some(input) {
            return Err(GraphError::NotConnected { output, input });
        }
        let (m_in, m_out) = self.splice_ports(module, output, input)?;

        self.disconnect(output)?;
        if let Err(err) = self.connect(output, m_in) {
            tracing::error!("graph_insert: {output} → {m_in} failed, restoring: {err}");
            self.restore(output, input);
            return Err(err);
        }
        if let Err(err) = self.connect(m_out, input) {
            tracing::error!("graph_insert: {m_out} → {input} failed, restoring: {err}");
            let _ = self.disconnect(m_in);
            self.restore(output, input);
            return Err(err);
        }
        tracing::debug!("graph_insert: {module} into {output} → {input}");
        Ok(())
    }

    /// Removes a module, bridging its first connected input's source to its
    /// first connected output's destination when both exist.
    ///
    /// The bridge pair is captured before any port is disconnected. Modules
    /// connected on only one side, or not at all, are removed without a bridge.
    pub fn remove_module(&mut self, id: ModuleId) -> Result<Removal, GraphError> {
        let slot = self.slot(id)?;
        let upstream = slot.inputs.iter().find_map(|p| p.peer);
        let downstream = slot.outputs.iter().find_map(|p| p.peer);

        self.disconnect_all(id)?;
        let module = self.take_slot(id).and_then(|s| s.module);

        let bridged = match (upstream, downstream) {
            (Some(up), Some(down)) => match self.connect(up, down) {
                Ok(_) => Some((up, down)),
                Err(err) => {
                    tracing::warn!("graph_remove: could not bridge {up} → {down}: {err}");
                    None
                }
            },
            _ => None,
        };
        tracing::debug!("graph_remove: {id} (bridged: {})", bridged.is_some());
        Ok(Removal { module, bridged })
    }

    /// Validates `module` for splicing and returns its first audio input and output.
    fn splice_ports(
        &self,
        module: ModuleId,
        output: PortId,
        input: PortId,
    ) -> Result<(PortId, PortId), GraphError> {
        let slot = self.slot(module)?;
        let ineligible = |reason| GraphError::InsertionIneligible { module, reason };
        if output.module == module || input.module == module {
            return Err(ineligible(IneligibleReason::OwnConnection));
        }
        let m_in = slot
            .inputs
            .iter()
            .position(|p| p.spec.data_type == DataType::Audio)
            .ok_or(ineligible(IneligibleReason::NoAudioInput))?;
        let m_out = slot
            .outputs
            .iter()
            .position(|p| p.spec.data_type == DataType::Audio)
            .ok_or(ineligible(IneligibleReason::NoAudioOutput))?;
        if slot.has_connections() {
            return Err(ineligible(IneligibleReason::AlreadyConnected));
        }
        Ok((PortId::input(module, m_in), PortId::output(module, m_out)))
    }

    fn restore(&mut self, output: PortId, input: PortId) {
        if let Err(err) = self.connect(output, input) {
            tracing::error!("graph_insert: could not restore {output} → {input}: {err}");
        }
    }
}
