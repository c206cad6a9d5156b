//! Uniform random selection

use rand::Rng;

use super::{ensure_candidates, RetryState, Selection, SelectionError, SelectionPolicy};
use crate::exchange::Exchange;
use crate::registry::Destination;

/// Picks a uniformly random candidate using the calling thread's RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPolicy;

impl RandomPolicy {
    pub fn new() -> Self {
        RandomPolicy
    }
}

impl SelectionPolicy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose(
        &self,
        candidates: &[Destination],
        _exchange: &Exchange,
        _retry: &mut RetryState,
    ) -> Result<Selection, SelectionError> {
        ensure_candidates(candidates)?;
        let index = rand::thread_rng().gen_range(0..candidates.len());
        Ok(Selection::One(candidates[index].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_random_single_candidate() {
        let only = Destination::new("direct:only").unwrap();
        let selection = RandomPolicy::new()
            .choose(
                std::slice::from_ref(&only),
                &Exchange::new(),
                &mut RetryState::new(),
            )
            .unwrap();
        assert_eq!(selection, Selection::One(only));
    }

    #[test]
    fn test_random_visits_every_candidate() {
        let candidates: Vec<_> = (0..4)
            .map(|i| Destination::new(format!("direct:{}", i)).unwrap())
            .collect();
        let policy = RandomPolicy::new();

        let mut counts: HashMap<Destination, usize> = HashMap::new();
        for _ in 0..4000 {
            if let Selection::One(d) = policy
                .choose(&candidates, &Exchange::new(), &mut RetryState::new())
                .unwrap()
            {
                *counts.entry(d).or_default() += 1;
            }
        }

        assert_eq!(counts.len(), 4);
        // Expected 1000 each; allow generous slack
        assert!(counts.values().all(|&c| c > 700 && c < 1300));
    }

    #[test]
    fn test_random_empty_candidates() {
        let result = RandomPolicy::new().choose(&[], &Exchange::new(), &mut RetryState::new());
        assert_eq!(result, Err(SelectionError::NoCandidates));
    }
}
