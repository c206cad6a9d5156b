//! Dispatch configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by every route's dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Per-send timeout in milliseconds; unset means no timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_timeout_ms: Option<u64>,
}

impl DispatchConfig {
    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout_ms.map(Duration::from_millis)
    }
}
