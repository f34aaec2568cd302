//! Port identities and schemas.
//!
//! A port is addressed by `(module, direction, index)`. Its data type and
//! label are fixed by the owning module's schema at construction.

use serde::{Deserialize, Serialize};

use crate::block::DataType;
use crate::graph::ModuleId;

/// Which side of a module a port is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Receives data from an upstream output.
    Input,
    /// Provides data to a downstream input.
    Output,
}

impl Direction {
    /// The other direction.
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// Stable address of a port in a [`Graph`](crate::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId {
    /// Owning module.
    pub module: ModuleId,
    /// Input or output side.
    pub direction: Direction,
    /// Position in the module's input or output list.
    pub index: usize,
}

impl PortId {
    /// The `index`-th input of `module`.
    pub const fn input(module: ModuleId, index: usize) -> Self {
        Self {
            module,
            direction: Direction::Input,
            index,
        }
    }

    /// The `index`-th output of `module`.
    pub const fn output(module: ModuleId, index: usize) -> Self {
        Self {
            module,
            direction: Direction::Output,
            index,
        }
    }

    /// Returns true for input ports.
    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }
}

impl core::fmt::Display for PortId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let side = match self.direction {
            Direction::Input => "in",
            Direction::Output => "out",
        };
        write!(f, "{}.{side}{}", self.module, self.index)
    }
}

/// Static description of one port in a module's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    /// Data carried by the port.
    pub data_type: DataType,
    /// Display label (UI hint only).
    pub label: &'static str,
}

impl PortSpec {
    /// An audio port.
    pub const fn audio(label: &'static str) -> Self {
        Self {
            data_type: DataType::Audio,
            label,
        }
    }

    /// A control port.
    pub const fn control(label: &'static str) -> Self {
        Self {
            data_type: DataType::Control,
            label,
        }
    }

    /// A MIDI port.
    pub const fn midi(label: &'static str) -> Self {
        Self {
            data_type: DataType::Midi,
            label,
        }
    }

    /// A cue port.
    pub const fn cue(label: &'static str) -> Self {
        Self {
            data_type: DataType::Cue,
            label,
        }
    }
}
