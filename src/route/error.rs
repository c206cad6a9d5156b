//! Error types for route construction

use thiserror::Error;

use crate::factory::ConfigurationError;
use crate::registry::RegistryError;

/// Errors raised while assembling a route from configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The route's policy descriptor could not be built
    #[error("Route '{route}' has an invalid policy: {source}")]
    Configuration {
        route: String,
        #[source]
        source: ConfigurationError,
    },

    /// The route's destination list is invalid
    #[error("Route '{route}' has invalid destinations: {source}")]
    Registry {
        route: String,
        #[source]
        source: RegistryError,
    },

    #[error("Route '{0}' is defined more than once")]
    DuplicateRoute(String),
}
