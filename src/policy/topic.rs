//! Broadcast selection

use super::{ensure_candidates, RetryState, Selection, SelectionError, SelectionPolicy};
use crate::exchange::Exchange;
use crate::registry::Destination;

/// Selects every candidate; the dispatcher sends a copy to each.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopicPolicy;

impl TopicPolicy {
    pub fn new() -> Self {
        TopicPolicy
    }
}

impl SelectionPolicy for TopicPolicy {
    fn name(&self) -> &str {
        "topic"
    }

    fn choose(
        &self,
        candidates: &[Destination],
        _exchange: &Exchange,
        _retry: &mut RetryState,
    ) -> Result<Selection, SelectionError> {
        ensure_candidates(candidates)?;
        Ok(Selection::All(candidates.to_vec()))
    }
}
