//! Configuration for the relay
//!
//! Configuration is layered:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`RELAY_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use relay::config::RelayConfig;
//!
//! let toml = r#"
//! [[routes]]
//! name = "orders"
//! destinations = ["mock:a", "mock:b"]
//!
//! [routes.policy]
//! type = "failover"
//! round_robin = true
//! "#;
//! let config: RelayConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.routes[0].policy.kind(), "failover");
//! ```

pub mod dispatch;
pub mod error;
pub mod logging;
pub mod route;

pub use dispatch::DispatchConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use route::RouteConfig;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Top-level relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    pub logging: LoggingConfig,
    pub dispatch: DispatchConfig,
    pub routes: Vec<RouteConfig>,
}

impl RelayConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `RELAY_*` environment variable overrides.
    ///
    /// Unparseable values are ignored and the current value kept.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("RELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("RELAY_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(timeout) = std::env::var("RELAY_SEND_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.dispatch.send_timeout_ms = Some(ms);
            }
        }
        self
    }

    /// Structural validation. Policy parameters are checked when routes are
    /// built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.send_timeout_ms == Some(0) {
            return Err(ConfigError::validation(
                "dispatch.send_timeout_ms",
                "timeout must be non-zero",
            ));
        }

        let mut names = HashSet::new();
        for (i, route) in self.routes.iter().enumerate() {
            if route.name.trim().is_empty() {
                return Err(ConfigError::validation(
                    format!("routes[{}].name", i),
                    "name cannot be empty",
                ));
            }
            if !names.insert(route.name.as_str()) {
                return Err(ConfigError::validation(
                    format!("routes[{}].name", i),
                    format!("duplicate route name '{}'", route.name),
                ));
            }

            let mut uris = HashSet::new();
            for (j, uri) in route.destinations.iter().enumerate() {
                let field = format!("routes[{}].destinations[{}]", i, j);
                if uri.trim().is_empty() {
                    return Err(ConfigError::validation(field, "URI cannot be empty"));
                }
                if !uris.insert(uri.trim()) {
                    return Err(ConfigError::validation(
                        field,
                        format!("duplicate destination '{}'", uri),
                    ));
                }
            }

            if route.policy.kind().trim().is_empty() {
                return Err(ConfigError::validation(
                    format!("routes[{}].policy.type", i),
                    "policy type cannot be empty",
                ));
            }
        }

        Ok(())
    }

    pub fn route(&self, name: &str) -> Result<&RouteConfig, ConfigError> {
        self.routes
            .iter()
            .find(|route| route.name == name)
            .ok_or_else(|| ConfigError::UnknownRoute(name.to_string()))
    }
}
