//! Config command handlers

use crate::cli::ConfigInitArgs;
use crate::config::RelayConfig;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../relay.example.toml");

/// Handle `relay config init` command
///
/// Writes the starter config, then reads it back so the command only
/// reports success for a file `relay validate` would accept.
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, EXAMPLE_CONFIG)?;

    let config = RelayConfig::load(Some(args.output.as_path()))?;
    config.validate()?;
    let names: Vec<&str> = config.routes.iter().map(|r| r.name.as_str()).collect();

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Routes: {}", names.join(", "));
    println!("  Edit the [[routes]] entries to describe your destinations.");

    Ok(())
}
