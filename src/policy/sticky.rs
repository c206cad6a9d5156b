//! Sticky (session-affinity) selection

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::{ensure_candidates, RetryState, Selection, SelectionError, SelectionPolicy};
use crate::exchange::{Exchange, KeyExpression};
use crate::registry::Destination;

/// Binds each correlation key to one destination for the lifetime of the route.
///
/// Keys are derived from the exchange through a [`KeyExpression`]. Unbound
/// keys are placed by the fallback policy. The first binding for a key is made
/// while holding that key's map entry, so concurrent first dispatches for the
/// same key agree on a single destination. Bindings are never evicted, except
/// that a binding whose destination has left the registry is replaced on the
/// next lookup.
#[derive(Debug)]
pub struct StickyPolicy {
    expression: KeyExpression,
    fallback: Arc<dyn SelectionPolicy>,
    bindings: DashMap<String, Destination>,
}

impl StickyPolicy {
    pub fn new(expression: KeyExpression, fallback: Arc<dyn SelectionPolicy>) -> Self {
        Self {
            expression,
            fallback,
            bindings: DashMap::new(),
        }
    }

    pub fn expression(&self) -> &KeyExpression {
        &self.expression
    }

    /// Destination currently bound to `key`, if any.
    pub fn bound_destination(&self, key: &str) -> Option<Destination> {
        self.bindings.get(key).map(|entry| entry.value().clone())
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    fn place(
        &self,
        candidates: &[Destination],
        exchange: &Exchange,
    ) -> Result<Destination, SelectionError> {
        let selection = self
            .fallback
            .choose(candidates, exchange, &mut RetryState::new())?;
        selection.first().cloned().ok_or(SelectionError::NoCandidates)
    }
}

impl SelectionPolicy for StickyPolicy {
    fn name(&self) -> &str {
        "sticky"
    }

    fn choose(
        &self,
        candidates: &[Destination],
        exchange: &Exchange,
        _retry: &mut RetryState,
    ) -> Result<Selection, SelectionError> {
        ensure_candidates(candidates)?;
        let key = self.expression.evaluate(exchange)?;

        if let Some(bound) = self.bindings.get(&key) {
            if candidates.contains(bound.value()) {
                return Ok(Selection::One(bound.value().clone()));
            }
        }

        let destination = match self.bindings.entry(key) {
            Entry::Occupied(mut entry) => {
                if candidates.contains(entry.get()) {
                    entry.get().clone()
                } else {
                    let replacement = self.place(candidates, exchange)?;
                    tracing::debug!(
                        key = %entry.key(),
                        stale = %entry.get(),
                        destination = %replacement,
                        "Rebinding sticky key"
                    );
                    entry.insert(replacement.clone());
                    replacement
                }
            }
            Entry::Vacant(entry) => {
                let destination = self.place(candidates, exchange)?;
                tracing::trace!(
                    key = %entry.key(),
                    destination = %destination,
                    "Binding sticky key"
                );
                entry.insert(destination.clone());
                destination
            }
        };

        Ok(Selection::One(destination))
    }
}
