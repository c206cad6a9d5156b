//! In-memory sender used by the CLI simulator and tests

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::time::Duration;

use super::{SendError, Sender};
use crate::exchange::Exchange;
use crate::registry::Destination;

/// A [`Sender`] that records deliveries instead of performing I/O.
///
/// Individual destinations can be told to fail with a given error or to
/// respond only after a delay.
#[derive(Debug, Default)]
pub struct SimulatedSender {
    failures: DashMap<String, SendError>,
    delays: DashMap<String, Duration>,
    attempts: DashMap<String, u64>,
    delivered: DashMap<String, u64>,
}

impl SimulatedSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `uri` fail with `error`.
    pub fn fail(&self, uri: impl Into<String>, error: SendError) {
        self.failures.insert(uri.into(), error);
    }

    /// Clear a previously configured failure.
    pub fn recover(&self, uri: &str) {
        self.failures.remove(uri);
    }

    /// Delay every send to `uri` by `delay`.
    pub fn delay(&self, uri: impl Into<String>, delay: Duration) {
        self.delays.insert(uri.into(), delay);
    }

    /// Sends attempted against `uri`, successful or not.
    pub fn attempts(&self, uri: &str) -> u64 {
        self.attempts.get(uri).map(|c| *c).unwrap_or(0)
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts.iter().map(|c| *c.value()).sum()
    }

    /// Successful deliveries to `uri`.
    pub fn delivered(&self, uri: &str) -> u64 {
        self.delivered.get(uri).map(|c| *c).unwrap_or(0)
    }

    /// Successful deliveries per destination, ordered by URI.
    pub fn delivered_counts(&self) -> BTreeMap<String, u64> {
        self.delivered
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

#[async_trait]
impl Sender for SimulatedSender {
    async fn send(&self, destination: &Destination, exchange: &Exchange) -> Result<(), SendError> {
        let uri = destination.uri();
        *self.attempts.entry(uri.to_string()).or_insert(0) += 1;

        let delay = self.delays.get(uri).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.get(uri).map(|e| e.value().clone());
        if let Some(error) = failure {
            tracing::trace!(destination = %destination, exchange_id = exchange.id(), "Simulated failure");
            return Err(error);
        }

        *self.delivered.entry(uri.to_string()).or_insert(0) += 1;
        Ok(())
    }
}
