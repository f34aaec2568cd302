//! Error types for graph mutation and module computation.

use thiserror::Error;

use crate::graph::ModuleId;
use crate::port::{Direction, PortId};

/// Why a module cannot be spliced into a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    /// The module has no audio input.
    NoAudioInput,
    /// The module has no audio output.
    NoAudioOutput,
    /// One of the module's ports is already connected.
    AlreadyConnected,
    /// The module is one of the endpoints of the target connection.
    OwnConnection,
}

impl core::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoAudioInput => write!(f, "module has no audio input"),
            Self::NoAudioOutput => write!(f, "module has no audio output"),
            Self::AlreadyConnected => write!(f, "module already has live connections"),
            Self::OwnConnection => write!(f, "module is an endpoint of the target connection"),
        }
    }
}

/// Errors returned by graph mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Both ports have the same direction.
    #[error("cannot connect {a} to {b}: both are {direction:?} ports")]
    Direction {
        /// First port.
        a: PortId,
        /// Second port.
        b: PortId,
        /// The shared direction.
        direction: Direction,
    },

    /// No module with this id is in the graph.
    #[error("module {0} not found")]
    ModuleNotFound(ModuleId),

    /// The module exists but has no port at this index.
    #[error("port {0} out of range")]
    PortOutOfRange(PortId),

    /// The module cannot be spliced; the graph is unchanged.
    #[error("cannot insert module {module}: {reason}")]
    InsertionIneligible {
        /// Module that was to be inserted.
        module: ModuleId,
        /// Why insertion was refused.
        reason: IneligibleReason,
    },

    /// The two ports are not connected to each other.
    #[error("{output} is not connected to {input}")]
    NotConnected {
        /// Upstream output port.
        output: PortId,
        /// Downstream input port.
        input: PortId,
    },

    /// The connection would close a cycle.
    #[error("connecting {output} to {input} would create a cycle")]
    CycleDetected {
        /// Upstream output port.
        output: PortId,
        /// Downstream input port.
        input: PortId,
    },
}

/// Errors a module can raise from `generate` or state restore.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModuleError {
    /// The computation failed for this block.
    #[error("compute failed: {0}")]
    Compute(String),

    /// A serialized state entry is malformed.
    #[error("invalid state for '{key}': {reason}")]
    InvalidState {
        /// Offending key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No parameter with this id exists.
    #[error("unknown parameter '{0}'")]
    UnknownParam(String),
}

impl ModuleError {
    /// Creates an [`InvalidState`](Self::InvalidState) error.
    pub fn invalid_state(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
