//! Logging configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Relay modules that can be given their own level under
/// `[logging.component_levels]`.
pub const COMPONENTS: &[&str] = &[
    "cli", "config", "dispatch", "exchange", "factory", "logging", "policy", "registry", "route",
];

/// The `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for everything without a component override
    pub level: String,
    pub format: LogFormat,
    /// Levels keyed by relay module. `dispatch = "debug"` shows state changes
    /// and failovers, `policy = "trace"` shows sticky bindings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
}

impl LoggingConfig {
    /// Configured components that name no relay module, sorted.
    pub fn unknown_components(&self) -> Vec<&str> {
        let mut unknown: Vec<&str> = self
            .component_levels
            .iter()
            .flat_map(|levels| levels.keys())
            .map(String::as_str)
            .filter(|component| !COMPONENTS.contains(component))
            .collect();
        unknown.sort_unstable();
        unknown
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
        }
    }
}
