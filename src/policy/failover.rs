//! Failover selection

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::{ensure_candidates, RetryState, Selection, SelectionError, SelectionPolicy};
use crate::dispatch::SendError;
use crate::exchange::Exchange;
use crate::registry::Destination;

const NO_LAST_GOOD: usize = usize::MAX;

/// Where a failover sequence starts scanning the candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailoverStart {
    /// Always start at the first candidate
    #[default]
    First,
    /// Each exchange starts one past where the previous one started
    RoundRobin,
    /// Start at the last destination that succeeded
    Sticky,
}

/// Tries candidates in order, moving to the next one on a triggering failure.
///
/// A sequence never revisits a destination excluded for the same exchange.
/// `maximum_failover_attempts` bounds the number of retries after the first
/// attempt (`None` means every candidate may be tried); the total number of
/// attempts never exceeds the candidate count.
#[derive(Debug)]
pub struct FailoverPolicy {
    triggers: Vec<String>,
    maximum_failover_attempts: Option<usize>,
    start: FailoverStart,
    cursor: AtomicU64,
    last_good: AtomicUsize,
}

impl FailoverPolicy {
    pub fn new(
        triggers: Vec<String>,
        maximum_failover_attempts: Option<usize>,
        start: FailoverStart,
    ) -> Self {
        Self {
            triggers,
            maximum_failover_attempts,
            start,
            cursor: AtomicU64::new(0),
            last_good: AtomicUsize::new(NO_LAST_GOOD),
        }
    }

    /// Failure kinds that trigger failover; empty means any failure does.
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    pub fn start(&self) -> FailoverStart {
        self.start
    }

    fn initial_offset(&self, len: usize) -> usize {
        match self.start {
            FailoverStart::First => 0,
            FailoverStart::RoundRobin => {
                (self.cursor.fetch_add(1, Ordering::Relaxed) % len as u64) as usize
            }
            FailoverStart::Sticky => match self.last_good.load(Ordering::Acquire) {
                NO_LAST_GOOD => 0,
                index => index % len,
            },
        }
    }
}

impl SelectionPolicy for FailoverPolicy {
    fn name(&self) -> &str {
        "failover"
    }

    fn choose(
        &self,
        candidates: &[Destination],
        _exchange: &Exchange,
        retry: &mut RetryState,
    ) -> Result<Selection, SelectionError> {
        ensure_candidates(candidates)?;
        let len = candidates.len();
        let start = retry.start_offset(|| self.initial_offset(len));

        (0..len)
            .map(|step| &candidates[(start + step) % len])
            .find(|candidate| !retry.is_excluded(candidate))
            .map(|candidate| Selection::One(candidate.clone()))
            .ok_or(SelectionError::Exhausted {
                attempted: retry.excluded_count(),
            })
    }

    fn should_failover(&self, error: &SendError) -> bool {
        self.triggers.is_empty() || self.triggers.iter().any(|kind| error.is_kind(kind))
    }

    fn max_attempts(&self, candidate_count: usize) -> usize {
        match self.maximum_failover_attempts {
            Some(retries) => retries.saturating_add(1).min(candidate_count),
            None => candidate_count,
        }
    }

    fn on_success(&self, candidates: &[Destination], chosen: &Destination) {
        if self.start != FailoverStart::Sticky {
            return;
        }
        if let Some(index) = candidates.iter().position(|d| d == chosen) {
            self.last_good.store(index, Ordering::Release);
        }
    }
}
