//! Selection policies.
//!
//! A [`SelectionPolicy`] decides which of the current candidates receive an
//! exchange. Policies are built once per route (see [`crate::factory`]) and
//! shared by every concurrent dispatch on that route, so any internal state
//! uses atomics or concurrent maps.

use std::collections::HashSet;
use std::fmt;

pub mod error;
pub mod failover;
pub mod kind;
pub mod random;
pub mod round_robin;
pub mod sticky;
pub mod topic;
pub mod weighted;

pub use error::SelectionError;
pub use failover::{FailoverPolicy, FailoverStart};
pub use kind::PolicyKind;
pub use random::RandomPolicy;
pub use round_robin::RoundRobinPolicy;
pub use sticky::StickyPolicy;
pub use topic::TopicPolicy;
pub use weighted::WeightedPolicy;

use crate::dispatch::SendError;
use crate::exchange::Exchange;
use crate::registry::Destination;

/// Outcome of a single `choose` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Send to exactly this destination
    One(Destination),
    /// Send to every listed destination
    All(Vec<Destination>),
}

impl Selection {
    /// The single destination, or the first of a broadcast set.
    pub fn first(&self) -> Option<&Destination> {
        match self {
            Selection::One(destination) => Some(destination),
            Selection::All(destinations) => destinations.first(),
        }
    }
}

/// Pluggable destination selection algorithm.
///
/// `choose` is called once per dispatch and, for failover-capable policies,
/// once more per retry. The `retry` state is owned by the dispatching task and
/// lives for a single exchange.
pub trait SelectionPolicy: Send + Sync + fmt::Debug {
    /// Policy type tag used in logs and reports
    fn name(&self) -> &str;

    /// Pick the destination(s) for `exchange` out of `candidates`
    fn choose(
        &self,
        candidates: &[Destination],
        exchange: &Exchange,
        retry: &mut RetryState,
    ) -> Result<Selection, SelectionError>;

    /// Whether a failed send should be retried against another candidate
    fn should_failover(&self, _error: &SendError) -> bool {
        false
    }

    /// Upper bound on send attempts for one exchange
    fn max_attempts(&self, _candidate_count: usize) -> usize {
        1
    }

    /// Called after a successful send to `chosen`
    fn on_success(&self, _candidates: &[Destination], _chosen: &Destination) {}
}

/// Per-exchange retry bookkeeping.
#[derive(Debug, Default)]
pub struct RetryState {
    excluded: HashSet<Destination>,
    start: Option<usize>,
    attempts: usize,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a destination for the rest of this exchange's retry sequence
    pub fn exclude(&mut self, destination: Destination) {
        self.excluded.insert(destination);
    }

    pub fn is_excluded(&self, destination: &Destination) -> bool {
        self.excluded.contains(destination)
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// Number of send attempts recorded so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub(crate) fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Starting offset for this retry sequence, computed on first use.
    pub fn start_offset(&mut self, init: impl FnOnce() -> usize) -> usize {
        *self.start.get_or_insert_with(init)
    }
}

/// Fail fast on an empty candidate list.
pub(crate) fn ensure_candidates(candidates: &[Destination]) -> Result<(), SelectionError> {
    if candidates.is_empty() {
        return Err(SelectionError::NoCandidates);
    }
    Ok(())
}
