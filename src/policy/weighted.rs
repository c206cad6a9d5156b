//! Weighted selection

use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{ensure_candidates, RetryState, Selection, SelectionError, SelectionPolicy};
use crate::exchange::Exchange;
use crate::factory::ConfigurationError;
use crate::registry::Destination;

/// Largest total weight accepted in round-robin mode (one schedule slot per unit).
pub const MAX_ROUND_ROBIN_TOTAL: u64 = 65_536;

/// Distributes exchanges proportionally to positional weights.
///
/// Weight `i` applies to candidate `i`. The cumulative table is built once;
/// each selection is a binary search over it. In random mode the draw is a
/// uniform value in `[0, total)`. In round-robin mode an interleaved schedule
/// of `total` slots is precomputed and walked with an atomic cursor, so every
/// window of `total` consecutive selections honors the ratio exactly.
#[derive(Debug)]
pub struct WeightedPolicy {
    weights: Vec<u32>,
    cumulative: Vec<u64>,
    total: u64,
    schedule: Option<Vec<usize>>,
    cursor: AtomicU64,
}

impl WeightedPolicy {
    /// Build the policy, failing when the weights sum to zero.
    pub fn new(weights: Vec<u32>, round_robin: bool) -> Result<Self, ConfigurationError> {
        let cumulative: Vec<u64> = weights
            .iter()
            .scan(0u64, |sum, &w| {
                *sum += u64::from(w);
                Some(*sum)
            })
            .collect();
        let total = cumulative.last().copied().unwrap_or(0);

        if total == 0 {
            return Err(ConfigurationError::ZeroTotalWeight {
                policy: "weighted".to_string(),
            });
        }

        let schedule = if round_robin {
            if total > MAX_ROUND_ROBIN_TOTAL {
                return Err(ConfigurationError::InvalidParameter {
                    policy: "weighted".to_string(),
                    parameter: "distribution_ratio".to_string(),
                    message: format!(
                        "total weight {} exceeds {} in round-robin mode",
                        total, MAX_ROUND_ROBIN_TOTAL
                    ),
                });
            }
            Some(smooth_schedule(&weights, total))
        } else {
            None
        };

        Ok(Self {
            weights,
            cumulative,
            total,
            schedule,
            cursor: AtomicU64::new(0),
        })
    }

    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    pub fn total_weight(&self) -> u64 {
        self.total
    }

    pub fn is_round_robin(&self) -> bool {
        self.schedule.is_some()
    }

    /// Index whose cumulative range contains `point` (`0 <= point < total`).
    fn index_for(&self, point: u64) -> usize {
        self.cumulative.partition_point(|&c| c <= point)
    }
}

/// Smooth weighted round-robin order: each step every entry gains its weight,
/// the largest current value wins and pays back the total.
fn smooth_schedule(weights: &[u32], total: u64) -> Vec<usize> {
    let total = total as i64;
    let mut current = vec![0i64; weights.len()];
    let mut schedule = Vec::with_capacity(total as usize);

    for _ in 0..total {
        let mut best = 0;
        for (i, &w) in weights.iter().enumerate() {
            current[i] += i64::from(w);
            if current[i] > current[best] {
                best = i;
            }
        }
        current[best] -= total;
        schedule.push(best);
    }

    schedule
}

impl SelectionPolicy for WeightedPolicy {
    fn name(&self) -> &str {
        "weighted"
    }

    fn choose(
        &self,
        candidates: &[Destination],
        _exchange: &Exchange,
        _retry: &mut RetryState,
    ) -> Result<Selection, SelectionError> {
        ensure_candidates(candidates)?;
        if candidates.len() != self.weights.len() {
            return Err(SelectionError::WeightMismatch {
                weights: self.weights.len(),
                candidates: candidates.len(),
            });
        }

        let index = match &self.schedule {
            Some(schedule) => {
                let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.total;
                schedule[slot as usize]
            }
            None => self.index_for(rand::thread_rng().gen_range(0..self.total)),
        };

        Ok(Selection::One(candidates[index].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn candidates(n: usize) -> Vec<Destination> {
        (0..n)
            .map(|i| Destination::new(format!("direct:{}", i)).unwrap())
            .collect()
    }

    fn counts(policy: &WeightedPolicy, candidates: &[Destination], draws: usize) -> Vec<usize> {
        let mut counts: HashMap<Destination, usize> = HashMap::new();
        for _ in 0..draws {
            if let Selection::One(d) = policy
                .choose(candidates, &Exchange::new(), &mut RetryState::new())
                .unwrap()
            {
                *counts.entry(d).or_default() += 1;
            }
        }
        candidates
            .iter()
            .map(|d| counts.get(d).copied().unwrap_or(0))
            .collect()
    }

    #[test]
    fn test_zero_total_weight_rejected() {
        let result = WeightedPolicy::new(vec![0, 0, 0], false);
        assert!(matches!(result, Err(ConfigurationError::ZeroTotalWeight { .. })));

        let result = WeightedPolicy::new(vec![], true);
        assert!(matches!(result, Err(ConfigurationError::ZeroTotalWeight { .. })));
    }

    #[test]
    fn test_index_for_boundaries() {
        let policy = WeightedPolicy::new(vec![2, 0, 3], false).unwrap();
        assert_eq!(policy.total_weight(), 5);
        assert_eq!(policy.index_for(0), 0);
        assert_eq!(policy.index_for(1), 0);
        assert_eq!(policy.index_for(2), 2);
        assert_eq!(policy.index_for(4), 2);
    }

    #[test]
    fn test_random_distribution_follows_weights() {
        let policy = WeightedPolicy::new(vec![4, 2, 1, 0], false).unwrap();
        let candidates = candidates(4);
        let draws = 70_000;
        let observed = counts(&policy, &candidates, draws);

        assert_eq!(observed[3], 0);
        let expected = [40_000.0, 20_000.0, 10_000.0];
        for (i, exp) in expected.iter().enumerate() {
            let deviation = (observed[i] as f64 - exp).abs() / exp;
            assert!(deviation < 0.05, "index {} off by {:.3}", i, deviation);
        }
    }

    #[test]
    fn test_round_robin_is_exact_per_cycle() {
        let policy = WeightedPolicy::new(vec![3, 1, 0, 2], true).unwrap();
        assert!(policy.is_round_robin());
        let observed = counts(&policy, &candidates(4), 60);
        assert_eq!(observed, vec![30, 10, 0, 20]);
    }

    #[test]
    fn test_round_robin_interleaves() {
        let policy = WeightedPolicy::new(vec![2, 1], true).unwrap();
        let candidates = candidates(2);
        let sequence: Vec<_> = (0..3)
            .map(|_| {
                policy
                    .choose(&candidates, &Exchange::new(), &mut RetryState::new())
                    .unwrap()
            })
            .collect();
        assert_eq!(
            sequence,
            vec![
                Selection::One(candidates[0].clone()),
                Selection::One(candidates[1].clone()),
                Selection::One(candidates[0].clone()),
            ]
        );
    }

    #[test]
    fn test_round_robin_total_limit() {
        let result = WeightedPolicy::new(vec![u32::MAX, 1], true);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_weight_count_must_match_candidates() {
        let policy = WeightedPolicy::new(vec![1, 1], false).unwrap();
        let result = policy.choose(&candidates(3), &Exchange::new(), &mut RetryState::new());
        assert_eq!(
            result,
            Err(SelectionError::WeightMismatch {
                weights: 2,
                candidates: 3
            })
        );
    }
}
