use clap::Parser;
use relay::cli::{
    handle_completions, handle_config_init, handle_destinations, handle_simulate,
    handle_validate, Cli, Commands, ConfigCommands,
};
use relay::config::{LoggingConfig, RelayConfig};

/// Logging settings from the config file when it loads, defaults otherwise.
fn logging_config(path: &std::path::Path, level: Option<&str>) -> LoggingConfig {
    let mut logging = RelayConfig::load(Some(path))
        .map(|config| config.with_env_overrides().logging)
        .unwrap_or_default();
    if let Some(level) = level {
        logging.level = level.to_string();
    }
    logging
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate(args) => handle_validate(&args).map(|output| println!("{}", output)),
        Commands::Simulate(args) => {
            let logging = logging_config(&args.config, args.log_level.as_deref());
            if let Err(e) = relay::logging::init_tracing(&logging) {
                eprintln!("Warning: Failed to initialize logging: {}", e);
            }
            handle_simulate(&args)
                .await
                .map(|output| println!("{}", output))
        }
        Commands::Destinations(args) => {
            handle_destinations(&args).map(|output| println!("{}", output))
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
