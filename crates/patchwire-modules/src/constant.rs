//! Constant control source.

use patchwire_core::{Block, Module, ModuleError, ParamDescriptor, ParamStore, PortIo, PortSpec};

const CONTROL_OUT: [PortSpec; 1] = [PortSpec::control("control")];

/// Constant control value.
///
/// # Parameters
///
/// - `value`: -1.0 to 1.0 (default 1.0)
pub struct Constant {
    params: ParamStore,
}

impl Constant {
    /// Output value.
    pub const VALUE: usize = 0;

    /// Creates a constant 1.0 source.
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            params: ParamStore::new(vec![ParamDescriptor::custom(
                "Value", "value", -1.0, 1.0, 1.0,
            )]),
        }
    }
}

impl Module for Constant {
    fn kind(&self) -> &'static str {
        "constant"
    }

    fn inputs(&self) -> &[PortSpec] {
        &[]
    }

    fn outputs(&self) -> &[PortSpec] {
        &CONTROL_OUT
    }

    fn params(&self) -> &ParamStore {
        &self.params
    }

    fn generate(&mut self, frames: usize, _io: &mut PortIo<'_>) -> Result<Block, ModuleError> {
        Ok(Block::Control(vec![self.params.get(Self::VALUE); frames]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwire_core::Graph;

    #[test]
    fn test_emits_value() {
        let mut graph = Graph::new(1000.0);
        let constant = graph.add(Box::new(Constant::new(1000.0)));
        assert_eq!(graph.pull(constant, 2), Block::Control(vec![1.0; 2]));
        graph.params(constant).unwrap().set(Constant::VALUE, -0.25);
        assert_eq!(graph.pull(constant, 4), Block::Control(vec![-0.25; 4]));
    }
}
