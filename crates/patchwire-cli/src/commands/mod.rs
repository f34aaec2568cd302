//! CLI command implementations.

pub mod export;
pub mod modules;
pub mod render;
