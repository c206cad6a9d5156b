//! Simulate command implementation

use std::sync::Arc;
use std::time::Duration;

use crate::cli::output::{format_simulation_json, format_simulation_table, SimulationSummary};
use crate::cli::{load_config, SimulateArgs};
use crate::config::ConfigError;
use crate::dispatch::{SendError, SimulatedSender};
use crate::exchange::Exchange;
use crate::factory::{NamedRegistry, PolicyFactory};
use crate::route::Route;

const DEFAULT_FAILURE_KIND: &str = "io";

/// Parse a `URI[=KIND]` failure flag.
///
/// Text after the last `=` is a kind only when it looks like one
/// (lowercase letters, `.` and `_`); otherwise the `=` belongs to the URI.
fn parse_failure(spec: &str) -> Result<(String, SendError), String> {
    let (uri, kind) = match spec.rsplit_once('=') {
        Some((uri, kind)) if kind.trim().is_empty() || is_failure_kind(kind.trim()) => {
            (uri.trim(), kind.trim())
        }
        _ => (spec.trim(), DEFAULT_FAILURE_KIND),
    };
    if uri.is_empty() || kind.is_empty() {
        return Err(format!("Invalid failure '{}'. Use: URI or URI=KIND", spec));
    }
    Ok((
        uri.to_string(),
        SendError::new(kind, format!("simulated {} failure", kind)),
    ))
}

fn is_failure_kind(kind: &str) -> bool {
    kind.bytes()
        .all(|b| b.is_ascii_lowercase() || b == b'.' || b == b'_')
}

/// Parse a `NAME=VALUE` header flag.
fn parse_header(spec: &str) -> Result<(String, String), String> {
    match spec.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid header '{}'. Use: NAME=VALUE", spec)),
    }
}

fn build_exchange(index: u32, headers: &[(String, String)]) -> Exchange {
    headers
        .iter()
        .fold(Exchange::new(), |exchange, (name, template)| {
            exchange.with_header(name.clone(), template.replace("{i}", &index.to_string()))
        })
}

/// Run a simulation and return its summary.
pub async fn run_simulation(
    args: &SimulateArgs,
) -> Result<SimulationSummary, Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    let route_config = config.route(&args.route)?;

    let failures = args
        .failures
        .iter()
        .map(|f| parse_failure(f))
        .collect::<Result<Vec<_>, _>>()?;
    let headers = args
        .headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>, _>>()?;

    let timeout = match args.send_timeout_ms {
        Some(0) => {
            return Err(
                ConfigError::validation("send_timeout_ms", "timeout must be non-zero").into(),
            )
        }
        Some(ms) => Some(Duration::from_millis(ms)),
        None => config.dispatch.send_timeout(),
    };

    let sender = Arc::new(SimulatedSender::new());
    for (uri, error) in failures {
        sender.fail(uri, error);
    }

    let route = Route::build(
        route_config,
        &PolicyFactory::default(),
        &NamedRegistry::new(),
        sender.clone(),
        timeout,
    )?;

    let mut summary = SimulationSummary {
        route: route.name().to_string(),
        policy: route.policy_name().to_string(),
        exchanges: args.count,
        ..SimulationSummary::default()
    };

    for index in 0..args.count {
        let exchange = build_exchange(index, &headers);
        let outcome = match route.dispatch(&exchange).await {
            Ok(report) => {
                summary.succeeded += 1;
                summary.retries += report.attempts.len().saturating_sub(1) as u64;
                "success"
            }
            Err(error) => {
                summary.failed += 1;
                tracing::debug!(exchange_id = exchange.id(), error = %error, "Simulated dispatch failed");
                error.outcome()
            }
        };
        *summary.outcomes.entry(outcome.to_string()).or_insert(0) += 1;
    }

    for destination in route.registry().list() {
        let uri = destination.uri();
        summary
            .attempts
            .insert(uri.to_string(), sender.attempts(uri));
        summary
            .deliveries
            .insert(uri.to_string(), sender.delivered(uri));
    }

    Ok(summary)
}

/// Handle `relay simulate` command
pub async fn handle_simulate(args: &SimulateArgs) -> Result<String, Box<dyn std::error::Error>> {
    let summary = run_simulation(args).await?;
    if args.json {
        Ok(format_simulation_json(&summary)?)
    } else {
        Ok(format_simulation_table(&summary))
    }
}
