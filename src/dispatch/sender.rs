//! The external send capability

use async_trait::async_trait;
use std::time::Duration;

use crate::exchange::Exchange;
use crate::registry::Destination;

/// A failed send attempt.
///
/// `kind` is a dotted classification (`io`, `io.connect`, `timeout`, ...)
/// matched against a failover policy's triggering kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct SendError {
    kind: String,
    message: String,
}

impl SendError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The failure raised when a send exceeds its time budget.
    pub fn timeout(after: Duration) -> Self {
        Self::new("timeout", format!("send timed out after {}ms", after.as_millis()))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this failure is of `kind` or one of its dotted sub-kinds.
    ///
    /// ```
    /// use relay::dispatch::SendError;
    ///
    /// let err = SendError::new("io.connect", "refused");
    /// assert!(err.is_kind("io"));
    /// assert!(err.is_kind("io.connect"));
    /// assert!(!err.is_kind("io.read"));
    /// ```
    pub fn is_kind(&self, kind: &str) -> bool {
        match self.kind.strip_prefix(kind) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

/// Delivers an exchange to a destination.
///
/// Supplied by the surrounding transport; this is the only place I/O happens.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, destination: &Destination, exchange: &Exchange) -> Result<(), SendError>;
}
