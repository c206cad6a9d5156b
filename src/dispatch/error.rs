//! Error types for dispatch failures

use thiserror::Error;

use super::SendError;
use crate::exchange::SelectionKeyError;
use crate::policy::SelectionError;
use crate::registry::Destination;

/// Errors surfaced to the caller of `dispatch`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The registry was empty when the exchange arrived
    #[error("No destinations available on route '{route}'")]
    NoDestinationsAvailable { route: String },

    /// The route has been stopped
    #[error("Route '{route}' is stopped")]
    RouteStopped { route: String },

    /// The correlation key could not be derived
    #[error("Could not derive selection key: {0}")]
    SelectionKey(#[from] SelectionKeyError),

    /// The policy could not choose a destination
    #[error("Selection failed: {0}")]
    Selection(SelectionError),

    /// A send failed and the policy does not retry it
    #[error("Send to '{destination}' failed: {source}")]
    SendFailed {
        destination: Destination,
        #[source]
        source: SendError,
    },

    /// Every allowed failover attempt failed.
    ///
    /// Returned both when every candidate was excluded and when
    /// `maximum_failover_attempts` ran out first, leaving some candidates
    /// untried. `attempts` is the number of sends made.
    #[error("All destinations failed after {attempts} attempts, last error: {last}")]
    AllDestinationsFailed { attempts: usize, last: SendError },

    /// At least one broadcast recipient failed
    #[error("Broadcast failed for {} destinations", .failures.len())]
    BroadcastFailed {
        delivered: Vec<Destination>,
        failures: Vec<(Destination, SendError)>,
    },
}

impl From<SelectionError> for DispatchError {
    fn from(error: SelectionError) -> Self {
        match error {
            SelectionError::Key(key) => DispatchError::SelectionKey(key),
            other => DispatchError::Selection(other),
        }
    }
}

impl DispatchError {
    /// Short label used for metrics and logs
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchError::NoDestinationsAvailable { .. } => "no_destinations",
            DispatchError::RouteStopped { .. } => "stopped",
            DispatchError::SelectionKey(_) => "selection_key",
            DispatchError::Selection(_) => "selection",
            DispatchError::SendFailed { .. } => "send_failed",
            DispatchError::AllDestinationsFailed { .. } => "all_failed",
            DispatchError::BroadcastFailed { .. } => "broadcast_failed",
        }
    }
}
