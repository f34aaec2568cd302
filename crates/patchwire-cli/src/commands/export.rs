//! Saves a demo graph as a patch file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use patchwire_config::{EngineConfig, Patch};

use crate::demos;

#[derive(Args)]
pub struct ExportArgs {
    /// Demo to export
    #[arg(value_name = "DEMO")]
    demo: String,

    /// Output patch file; `.json` writes JSON, anything else TOML
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
}

pub fn run(args: ExportArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let info = demos::find(&args.demo)
        .ok_or_else(|| anyhow::anyhow!("Unknown demo: {}", args.demo))?;
    let demo = (info.build)(config.sample_rate)?;
    let mut patch = Patch::capture(&demo.graph);
    patch.name = info.name.to_string();
    patch
        .save(&args.output)
        .with_context(|| format!("saving patch {}", args.output.display()))?;
    println!(
        "Saved {} ({} modules, {} connections) to {}",
        info.name,
        patch.len(),
        patch.connections.len(),
        args.output.display()
    );
    if patch
        .modules
        .iter()
        .any(|m| matches!(m.kind.as_str(), "player" | "convolve"))
    {
        println!("Note: sample and impulse data are not stored in patches.");
    }
    Ok(())
}
