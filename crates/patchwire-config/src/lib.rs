//! Configuration and patch persistence for patchwire.
//!
//! - [`EngineConfig`]: sample rate, block size and default log filter, read
//!   from a TOML file
//! - [`Patch`]: a serde snapshot of a graph's modules, their parameter state
//!   and their connections, saved as TOML or JSON and rebuilt through a
//!   [`ModuleRegistry`]
//!
//! # Example
//!
//! ```rust,no_run
//! use patchwire_config::{EngineConfig, ModuleRegistry, Patch};
//!
//! let config = EngineConfig::load("patchwire.toml").unwrap_or_default();
//! let patch = Patch::load("live.toml").unwrap();
//! let (graph, ids) = patch
//!     .instantiate(&ModuleRegistry::new(), config.sample_rate)
//!     .unwrap();
//! println!("{} modules", ids.len());
//! ```

mod engine_config;
mod error;
mod patch;

pub use engine_config::EngineConfig;
pub use error::ConfigError;
pub use patch::{Patch, PatchConnection, PatchModule, PatchPort};

/// Re-export commonly used types from patchwire-registry
pub use patchwire_registry::{ModuleCategory, ModuleDescriptor, ModuleRegistry};
