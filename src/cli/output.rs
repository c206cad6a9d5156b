//! Output formatting helpers for CLI commands

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

use crate::route::Route;

/// View model for route display
#[derive(Debug, Clone, Serialize)]
pub struct RouteView {
    pub name: String,
    pub policy: String,
    pub destinations: Vec<String>,
    pub running: bool,
}

impl From<&Route> for RouteView {
    fn from(route: &Route) -> Self {
        Self {
            name: route.name().to_string(),
            policy: route.policy_name().to_string(),
            destinations: route
                .registry()
                .list()
                .iter()
                .map(|d| d.uri().to_string())
                .collect(),
            running: route.is_running(),
        }
    }
}

/// Aggregated result of a simulation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationSummary {
    pub route: String,
    pub policy: String,
    pub exchanges: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// Send attempts beyond the first, summed over all exchanges
    pub retries: u64,
    /// Successful deliveries per destination URI
    pub deliveries: BTreeMap<String, u64>,
    /// Send attempts per destination URI
    pub attempts: BTreeMap<String, u64>,
    /// Dispatch outcomes by label (`success`, `all_failed`, ...)
    pub outcomes: BTreeMap<String, u32>,
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn running_label(running: bool) -> String {
    if running {
        "Running".green().to_string()
    } else {
        "Stopped".red().to_string()
    }
}

/// Format routes as a summary table
pub fn format_routes_table(routes: &[RouteView]) -> String {
    let mut table = new_table(vec!["Route", "Policy", "Destinations", "Status"]);
    for r in routes {
        table.add_row(vec![
            Cell::new(&r.name),
            Cell::new(&r.policy),
            Cell::new(r.destinations.len()),
            Cell::new(running_label(r.running)),
        ]);
    }
    table.to_string()
}

/// Format routes as JSON
pub fn format_routes_json(routes: &[RouteView]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "routes": routes }))
}

/// Format one row per destination
pub fn format_destinations_table(routes: &[RouteView]) -> String {
    let mut table = new_table(vec!["Route", "#", "Destination", "Policy"]);
    for r in routes {
        for (i, uri) in r.destinations.iter().enumerate() {
            table.add_row(vec![
                Cell::new(&r.name),
                Cell::new(i),
                Cell::new(uri),
                Cell::new(&r.policy),
            ]);
        }
    }
    table.to_string()
}

/// Format a simulation run as a per-destination table plus an outcome line
pub fn format_simulation_table(summary: &SimulationSummary) -> String {
    let mut table = new_table(vec!["Destination", "Attempts", "Delivered", "Share"]);
    let total: u64 = summary.deliveries.values().sum();

    for (uri, attempts) in &summary.attempts {
        let delivered = summary.deliveries.get(uri).copied().unwrap_or(0);
        let share = if total == 0 {
            0.0
        } else {
            delivered as f64 * 100.0 / total as f64
        };
        table.add_row(vec![
            Cell::new(uri),
            Cell::new(attempts),
            Cell::new(delivered),
            Cell::new(format!("{:.1}%", share)),
        ]);
    }

    let outcomes: Vec<String> = summary
        .outcomes
        .iter()
        .map(|(label, count)| format!("{}={}", outcome_label(label), count))
        .collect();

    format!(
        "Route {} ({}): {} exchanges, {} succeeded, {} failed, {} retries\n{}\nOutcomes: {}",
        summary.route.bold(),
        summary.policy,
        summary.exchanges,
        summary.succeeded,
        summary.failed,
        summary.retries,
        table,
        outcomes.join(", ")
    )
}

/// Format a simulation run as JSON
pub fn format_simulation_json(summary: &SimulationSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

/// Colorize a dispatch outcome label
pub fn outcome_label(outcome: &str) -> String {
    match outcome {
        "success" => outcome.green().to_string(),
        "send_failed" | "all_failed" | "broadcast_failed" => outcome.red().to_string(),
        _ => outcome.yellow().to_string(),
    }
}
