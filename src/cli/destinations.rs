//! Destinations command implementation

use crate::cli::output::{format_destinations_table, format_routes_json, RouteView};
use crate::cli::{load_config, DestinationsArgs};
use crate::config::ConfigError;

/// Handle `relay destinations` command
pub fn handle_destinations(args: &DestinationsArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;

    let routes = match &args.route {
        Some(name) => vec![config.route(name)?],
        None => config.routes.iter().collect(),
    };
    if routes.is_empty() {
        return Err(ConfigError::validation("routes", "no routes defined").into());
    }

    let views: Vec<RouteView> = routes
        .into_iter()
        .map(|route| RouteView {
            name: route.name.clone(),
            policy: route.policy.kind().to_string(),
            destinations: route.destinations.iter().map(|d| d.trim().to_string()).collect(),
            running: true,
        })
        .collect();

    if args.json {
        Ok(format_routes_json(&views)?)
    } else {
        Ok(format_destinations_table(&views))
    }
}
