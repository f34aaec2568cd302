//! patchwire CLI - lists modules and renders patches offline.

mod commands;
mod demos;
mod wav;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use patchwire_config::EngineConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "patchwire")]
#[command(author, version, about = "Modular signal graph renderer", long_about = None)]
struct Cli {
    /// Engine settings file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered modules and their parameters
    Modules(commands::modules::ModulesArgs),

    /// Render a demo or a saved patch to a WAV file
    Render(commands::render::RenderArgs),

    /// Save a demo's graph as a patch file
    Export(commands::export::ExportArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    }
    .sanitized();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(
        sample_rate = config.sample_rate,
        block_size = config.block_size,
        "engine config"
    );

    match cli.command {
        Commands::Modules(args) => commands::modules::run(args),
        Commands::Render(args) => commands::render::run(args, &config),
        Commands::Export(args) => commands::export::run(args, &config),
    }
}
