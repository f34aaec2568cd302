//! Module listing and information command.

use clap::Args;
use patchwire_core::ParamDescriptor;
use patchwire_registry::{ModuleCategory, ModuleRegistry};

#[derive(Args)]
pub struct ModulesArgs {
    /// Show details for a specific module kind
    #[arg(value_name = "KIND")]
    kind: Option<String>,
}

pub fn run(args: ModulesArgs) -> anyhow::Result<()> {
    let registry = ModuleRegistry::new();

    let Some(kind) = &args.kind else {
        println!("Available Modules");
        println!("=================");
        for category in ModuleCategory::ALL {
            println!();
            println!("{}", category.name());
            for module in registry.in_category(category) {
                println!("  {:15} - {}", module.id, module.description);
            }
        }
        println!();
        println!("Use 'patchwire modules <kind>' for ports and parameters.");
        return Ok(());
    };

    let descriptor = registry
        .get(kind)
        .ok_or_else(|| anyhow::anyhow!("Unknown module: {kind}"))?;
    let module = registry
        .create(kind, 48000.0)
        .ok_or_else(|| anyhow::anyhow!("Unknown module: {kind}"))?;

    println!("{} ({})", descriptor.name, descriptor.id);
    println!("{}", "=".repeat(descriptor.name.len() + descriptor.id.len() + 3));
    println!();
    println!("{}", descriptor.description);
    println!("Category: {}", descriptor.category.name());
    println!();

    println!("Inputs:");
    if descriptor.inputs.is_empty() {
        println!("  (none)");
    }
    for (i, port) in descriptor.inputs.iter().enumerate() {
        println!("  {i}: {:12} {}", port.label, port.data_type);
    }
    println!("Outputs:");
    if descriptor.outputs.is_empty() {
        println!("  (none)");
    }
    for (i, port) in descriptor.outputs.iter().enumerate() {
        println!("  {i}: {:12} {}", port.label, port.data_type);
    }
    println!();

    let params = module.params().descriptors();
    if params.is_empty() {
        println!("No parameters.");
        return Ok(());
    }
    println!("Parameters:");
    println!();
    println!("  {:14}  {:20}  {:12}  Range", "Id", "Name", "Default");
    println!("  {:14}  {:20}  {:12}  -----", "--", "----", "-------");
    for param in params {
        let range = format!(
            "{} .. {}",
            format_value(param, param.min),
            format_value(param, param.max)
        );
        println!(
            "  {:14}  {:20}  {:12}  {range}",
            param.string_id,
            param.name,
            format_value(param, param.default),
        );
    }
    Ok(())
}

fn format_value(param: &ParamDescriptor, value: f32) -> String {
    if param.step >= 1.0 {
        format!("{}{}", value.round(), param.unit.suffix())
    } else {
        format!("{value:.2}{}", param.unit.suffix())
    }
}
