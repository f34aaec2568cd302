//! Offline rendering of a demo or a saved patch.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use patchwire_config::{EngineConfig, Patch};
use patchwire_core::{Engine, Graph, StereoBuffer, linear_to_db};
use patchwire_modules::PlayerHandle;
use patchwire_registry::ModuleRegistry;

use crate::demos;
use crate::wav::write_stereo;

#[derive(Args)]
pub struct RenderArgs {
    /// Demo to render (see --list)
    #[arg(value_name = "DEMO", conflicts_with = "patch")]
    demo: Option<String>,

    /// Patch file (TOML or JSON) to render instead of a demo
    #[arg(short, long, value_name = "FILE")]
    patch: Option<PathBuf>,

    /// List the built-in demos
    #[arg(long)]
    list: bool,

    /// Output WAV file
    #[arg(short, long, value_name = "FILE", required_unless_present = "list")]
    output: Option<PathBuf>,

    /// Length to render in seconds
    #[arg(short, long, default_value = "5.0")]
    seconds: f32,

    /// Override the configured sample rate
    #[arg(long)]
    sample_rate: Option<f32>,

    /// Override the configured block size
    #[arg(long)]
    block_size: Option<usize>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: RenderArgs, config: &EngineConfig) -> anyhow::Result<()> {
    if args.list {
        println!("Demos");
        println!("=====");
        for demo in demos::DEMOS {
            println!("  {:10} - {}", demo.name, demo.description);
        }
        return Ok(());
    }
    let Some(output) = &args.output else {
        anyhow::bail!("--output is required");
    };
    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        anyhow::bail!("--seconds must be positive");
    }

    let sample_rate = args.sample_rate.unwrap_or(config.sample_rate);
    let block_size = args.block_size.unwrap_or(config.block_size).max(1);
    let (graph, mut players) = build_graph(&args, sample_rate)?;
    if graph.sinks().next().is_none() {
        anyhow::bail!("graph has no endpoint to render");
    }
    println!(
        "Rendering {} modules at {} Hz, {} frames per block...",
        graph.module_count(),
        sample_rate,
        block_size
    );

    let total = (args.seconds * sample_rate).round() as usize;
    let mut engine = Engine::new(graph);
    let mut block = StereoBuffer::new(block_size);
    let mut rendered = StereoBuffer::new(0);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    while rendered.len() < total {
        let frames = block_size.min(total - rendered.len());
        if block.len() != frames {
            block.resize(frames);
        }
        engine.render(&mut block);
        rendered.left.extend_from_slice(&block.left);
        rendered.right.extend_from_slice(&block.right);
        pb.set_position(rendered.len() as u64);
    }
    pb.finish_with_message("done");

    let peak = rendered.peak();
    let rms = (rendered
        .left
        .iter()
        .chain(&rendered.right)
        .map(|x| x * x)
        .sum::<f32>()
        / (2 * rendered.len().max(1)) as f32)
        .sqrt();
    println!("\nStats:");
    println!(
        "  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms),
        linear_to_db(peak)
    );
    for (i, player) in players.iter_mut().enumerate() {
        match player.wait_for_bpm() {
            Some(bpm) => println!("  Player {i}: {bpm:.1} BPM"),
            None => println!("  Player {i}: no tempo detected"),
        }
    }

    println!("\nWriting {}...", output.display());
    write_stereo(output, &rendered, sample_rate.round() as u32, args.bit_depth)?;
    println!("Done!");
    Ok(())
}

fn build_graph(args: &RenderArgs, sample_rate: f32) -> anyhow::Result<(Graph, Vec<PlayerHandle>)> {
    if let Some(path) = &args.patch {
        let patch = Patch::load(path).with_context(|| format!("loading patch {}", path.display()))?;
        let (graph, _) = patch
            .instantiate(&ModuleRegistry::new(), sample_rate)
            .with_context(|| format!("instantiating patch {}", path.display()))?;
        return Ok((graph, Vec::new()));
    }
    let Some(name) = &args.demo else {
        anyhow::bail!("No demo or patch specified. Use 'patchwire render --list' to see demos");
    };
    let info = demos::find(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown demo: {name}"))?;
    let demo = (info.build)(sample_rate).with_context(|| format!("building demo {name}"))?;
    Ok((demo.graph, demo.players))
}
