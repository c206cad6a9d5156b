//! CLI for the relay
//!
//! # Commands
//!
//! - `validate` - Check a configuration file and build every route
//! - `simulate` - Push exchanges through a route with an in-memory sender
//! - `destinations` - List each route's destinations and policy
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Write a starter configuration
//! relay config init
//!
//! # Send 100 exchanges through "orders" with one destination down
//! relay simulate orders -n 100 --fail mock:orders-a=io.connect
//!
//! # Generate shell completions
//! relay completions bash > ~/.bash_completion.d/relay
//! ```

pub mod completions;
pub mod config;
pub mod destinations;
pub mod output;
pub mod simulate;
pub mod validate;

pub use completions::handle_completions;
pub use config::handle_config_init;
pub use destinations::handle_destinations;
pub use simulate::handle_simulate;
pub use validate::handle_validate;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::RelayConfig;

/// Relay - destination selection and dispatch
#[derive(Parser, Debug)]
#[command(
    name = "relay",
    version,
    about = "Load-balancing dispatcher for message routes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a configuration file
    Validate(ValidateArgs),
    /// Simulate dispatching exchanges through a route
    Simulate(SimulateArgs),
    /// List route destinations
    Destinations(DestinationsArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Route to dispatch through
    pub route: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Number of exchanges to dispatch
    #[arg(short = 'n', long, default_value = "10")]
    pub count: u32,

    /// Make a destination fail, as URI or URI=KIND (kind defaults to "io")
    #[arg(short, long = "fail", value_name = "URI[=KIND]")]
    pub failures: Vec<String>,

    /// Header set on every exchange, as NAME=VALUE; `{i}` is replaced by the exchange index
    #[arg(short = 'H', long = "header", value_name = "NAME=VALUE")]
    pub headers: Vec<String>,

    /// Per-send timeout in milliseconds
    #[arg(long)]
    pub send_timeout_ms: Option<u64>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DestinationsArgs {
    /// Only show this route
    #[arg(short, long)]
    pub route: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "relay.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load, apply env overrides and validate a configuration file.
pub fn load_config(path: &Path) -> Result<RelayConfig, Box<dyn std::error::Error>> {
    let config = RelayConfig::load(Some(path))?.with_env_overrides();
    config.validate()?;
    Ok(config)
}
