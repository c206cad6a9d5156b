//! Round-robin selection

use std::sync::atomic::{AtomicU64, Ordering};

use super::{ensure_candidates, RetryState, Selection, SelectionError, SelectionPolicy};
use crate::exchange::Exchange;
use crate::registry::Destination;

/// Rotates through candidates in registry order.
///
/// The cursor is advanced with a single `fetch_add`, so no two concurrent
/// callers ever observe the same cursor value.
#[derive(Debug, Default)]
pub struct RoundRobinPolicy {
    cursor: AtomicU64,
}

impl RoundRobinPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next cursor value and map it onto `len` slots. `len` must be
    /// non-zero.
    fn next_index(&self, len: usize) -> usize {
        let counter = self.cursor.fetch_add(1, Ordering::Relaxed);
        (counter % len as u64) as usize
    }
}

impl SelectionPolicy for RoundRobinPolicy {
    fn name(&self) -> &str {
        "round-robin"
    }

    fn choose(
        &self,
        candidates: &[Destination],
        _exchange: &Exchange,
        _retry: &mut RetryState,
    ) -> Result<Selection, SelectionError> {
        ensure_candidates(candidates)?;
        let index = self.next_index(candidates.len());
        Ok(Selection::One(candidates[index].clone()))
    }
}
