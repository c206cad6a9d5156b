//! Validate command implementation

use std::sync::Arc;

use crate::cli::output::{format_routes_json, format_routes_table, RouteView};
use crate::cli::{load_config, ValidateArgs};
use crate::dispatch::SimulatedSender;
use crate::factory::{NamedRegistry, PolicyFactory};
use crate::route::RouteSet;

/// Handle `relay validate` command
///
/// Every route is built, so bad policy descriptors are reported here rather
/// than on first dispatch.
pub fn handle_validate(args: &ValidateArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    let routes = RouteSet::from_config(
        &config,
        &PolicyFactory::default(),
        &NamedRegistry::new(),
        Arc::new(SimulatedSender::new()),
    )?;

    let views: Vec<RouteView> = routes.iter().map(|r| RouteView::from(r.as_ref())).collect();
    if args.json {
        return Ok(format_routes_json(&views)?);
    }

    Ok(format!(
        "{}\n✓ Configuration valid: {} route(s)",
        format_routes_table(&views),
        views.len()
    ))
}
