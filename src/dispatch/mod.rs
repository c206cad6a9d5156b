//! Dispatcher: select destination(s) for an exchange and send it.
//!
//! Per exchange the dispatcher walks
//! `Init → Selecting → Sending → {Success | RetrySelecting | Failed}`, where
//! `RetrySelecting` is only reachable for policies that fail over and always
//! leads back to `Sending`. Retries are bounded by the candidate count.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod error;
pub mod sender;
pub mod simulated;

pub use error::DispatchError;
pub use sender::{SendError, Sender};
pub use simulated::SimulatedSender;

use crate::exchange::Exchange;
use crate::policy::{RetryState, Selection, SelectionError, SelectionPolicy};
use crate::registry::{Destination, DestinationRegistry};

/// Dispatcher state for a single exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Init,
    Selecting,
    Sending,
    RetrySelecting,
    Success,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Success | DispatchState::Failed)
    }
}

/// One send attempt made while dispatching an exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub destination: Destination,
    pub error: Option<SendError>,
}

impl AttemptRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub exchange_id: String,
    pub route: String,
    pub policy: String,
    /// Destinations that accepted the exchange
    pub delivered_to: Vec<Destination>,
    /// Every send attempt in order
    pub attempts: Vec<AttemptRecord>,
    /// States visited, from `Init` to the terminal state
    pub states: Vec<DispatchState>,
}

impl DispatchReport {
    pub fn final_state(&self) -> Option<DispatchState> {
        self.states.last().copied()
    }
}

/// Orchestrates selection and sending for one dispatch point.
pub struct Dispatcher {
    route: String,
    registry: Arc<DestinationRegistry>,
    policy: Arc<dyn SelectionPolicy>,
    sender: Arc<dyn Sender>,
    send_timeout: Option<Duration>,
}

/// Per-exchange bookkeeping
struct Trail<'a> {
    route: &'a str,
    exchange_id: &'a str,
    states: Vec<DispatchState>,
    attempts: Vec<AttemptRecord>,
}

impl<'a> Trail<'a> {
    fn new(route: &'a str, exchange_id: &'a str) -> Self {
        Self {
            route,
            exchange_id,
            states: vec![DispatchState::Init],
            attempts: Vec::new(),
        }
    }

    fn enter(&mut self, next: DispatchState) {
        tracing::trace!(
            route = self.route,
            exchange_id = self.exchange_id,
            state = ?next,
            "Dispatch state change"
        );
        self.states.push(next);
    }
}

impl Dispatcher {
    pub fn new(
        route: impl Into<String>,
        registry: Arc<DestinationRegistry>,
        policy: Arc<dyn SelectionPolicy>,
        sender: Arc<dyn Sender>,
    ) -> Self {
        Self {
            route: route.into(),
            registry,
            policy,
            sender,
            send_timeout: None,
        }
    }

    /// Fail sends that take longer than `timeout` with kind `timeout`.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn registry(&self) -> &Arc<DestinationRegistry> {
        &self.registry
    }

    pub fn policy(&self) -> &Arc<dyn SelectionPolicy> {
        &self.policy
    }

    /// Dispatch one exchange.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`]. An empty registry fails with
    /// `NoDestinationsAvailable` before the policy is consulted.
    pub async fn dispatch(&self, exchange: &Exchange) -> Result<DispatchReport, DispatchError> {
        let started = Instant::now();
        let result = self.run(exchange).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        metrics::counter!(
            "relay_dispatch_total",
            "route" => self.route.clone(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("relay_dispatch_duration_seconds", "route" => self.route.clone())
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(report) => tracing::debug!(
                route = %self.route,
                exchange_id = exchange.id(),
                delivered = report.delivered_to.len(),
                attempts = report.attempts.len(),
                "Exchange dispatched"
            ),
            Err(error) => tracing::warn!(
                route = %self.route,
                exchange_id = exchange.id(),
                outcome,
                error = %error,
                "Dispatch failed"
            ),
        }

        result
    }

    async fn run(&self, exchange: &Exchange) -> Result<DispatchReport, DispatchError> {
        let candidates = self.registry.snapshot();
        if candidates.is_empty() {
            return Err(DispatchError::NoDestinationsAvailable {
                route: self.route.clone(),
            });
        }

        let mut trail = Trail::new(&self.route, exchange.id());
        let mut retry = RetryState::new();
        let budget = self.policy.max_attempts(candidates.len()).clamp(1, candidates.len());
        let mut last_error: Option<SendError> = None;

        trail.enter(DispatchState::Selecting);
        loop {
            let selection = match self.policy.choose(&candidates, exchange, &mut retry) {
                Ok(selection) => selection,
                Err(error) => {
                    trail.enter(DispatchState::Failed);
                    return Err(match (error, last_error) {
                        (SelectionError::Exhausted { .. }, Some(last)) => {
                            DispatchError::AllDestinationsFailed {
                                attempts: retry.attempts(),
                                last,
                            }
                        }
                        (error, _) => error.into(),
                    });
                }
            };
            let destination = match selection {
                Selection::All(destinations) if destinations.is_empty() => {
                    trail.enter(DispatchState::Failed);
                    return Err(DispatchError::Selection(SelectionError::NoCandidates));
                }
                Selection::All(destinations) => {
                    trail.enter(DispatchState::Sending);
                    return self.broadcast(exchange, destinations, trail).await;
                }
                Selection::One(destination) => destination,
            };
            trail.enter(DispatchState::Sending);

            retry.record_attempt();
            let error = match self.send_one(&destination, exchange).await {
                Ok(()) => {
                    self.policy.on_success(&candidates, &destination);
                    trail.attempts.push(AttemptRecord {
                        destination: destination.clone(),
                        error: None,
                    });
                    trail.enter(DispatchState::Success);
                    return Ok(self.report(exchange, vec![destination], trail));
                }
                Err(error) => error,
            };

            trail.attempts.push(AttemptRecord {
                destination: destination.clone(),
                error: Some(error.clone()),
            });

            if !self.policy.should_failover(&error) {
                trail.enter(DispatchState::Failed);
                return Err(DispatchError::SendFailed {
                    destination,
                    source: error,
                });
            }

            if retry.attempts() >= budget {
                trail.enter(DispatchState::Failed);
                return Err(DispatchError::AllDestinationsFailed {
                    attempts: retry.attempts(),
                    last: error,
                });
            }

            tracing::info!(
                route = %self.route,
                exchange_id = exchange.id(),
                destination = %destination,
                attempt = retry.attempts(),
                error = %error,
                "Failing over to next destination"
            );
            metrics::counter!("relay_failover_total", "route" => self.route.clone()).increment(1);

            retry.exclude(destination);
            last_error = Some(error);
            trail.enter(DispatchState::RetrySelecting);
        }
    }

    async fn broadcast(
        &self,
        exchange: &Exchange,
        destinations: Vec<Destination>,
        mut trail: Trail<'_>,
    ) -> Result<DispatchReport, DispatchError> {
        let sends = destinations.iter().map(|destination| async move {
            (destination, self.send_one(destination, exchange).await)
        });
        let results = futures::future::join_all(sends).await;

        let mut delivered = Vec::new();
        let mut failures = Vec::new();
        for (destination, result) in results {
            trail.attempts.push(AttemptRecord {
                destination: destination.clone(),
                error: result.as_ref().err().cloned(),
            });
            match result {
                Ok(()) => delivered.push(destination.clone()),
                Err(error) => failures.push((destination.clone(), error)),
            }
        }

        if !failures.is_empty() {
            trail.enter(DispatchState::Failed);
            return Err(DispatchError::BroadcastFailed {
                delivered,
                failures,
            });
        }

        trail.enter(DispatchState::Success);
        Ok(self.report(exchange, delivered, trail))
    }

    async fn send_one(&self, destination: &Destination, exchange: &Exchange) -> Result<(), SendError> {
        tracing::trace!(
            route = %self.route,
            exchange_id = exchange.id(),
            destination = %destination,
            "Sending exchange"
        );
        match self.send_timeout {
            Some(limit) => tokio::time::timeout(limit, self.sender.send(destination, exchange))
                .await
                .unwrap_or_else(|_| Err(SendError::timeout(limit))),
            None => self.sender.send(destination, exchange).await,
        }
    }

    fn report(
        &self,
        exchange: &Exchange,
        delivered_to: Vec<Destination>,
        trail: Trail<'_>,
    ) -> DispatchReport {
        DispatchReport {
            exchange_id: exchange.id().to_string(),
            route: self.route.clone(),
            policy: self.policy.name().to_string(),
            delivered_to,
            attempts: trail.attempts,
            states: trail.states,
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("route", &self.route)
            .field("policy", &self.policy.name())
            .field("destinations", &self.registry.size())
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}
