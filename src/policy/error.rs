//! Error types for destination selection

use thiserror::Error;

use crate::exchange::SelectionKeyError;

/// Errors a selection policy can raise while choosing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The candidate list handed to the policy was empty
    #[error("No destinations available")]
    NoCandidates,

    /// Every candidate has been excluded for this exchange
    #[error("All {attempted} destinations excluded")]
    Exhausted { attempted: usize },

    /// Weight table and candidate list disagree in length
    #[error("Weighted policy has {weights} weights but {candidates} destinations")]
    WeightMismatch { weights: usize, candidates: usize },

    /// The correlation key could not be derived from the exchange
    #[error("Selection key error: {0}")]
    Key(#[from] SelectionKeyError),
}
