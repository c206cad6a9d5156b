//! Error types for policy construction

use thiserror::Error;

/// Failure resolving a named object from the lookup collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no object bound under reference '{0}'")]
    ReferenceNotFound(String),

    #[error("object bound under '{name}' is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },
}

/// Errors raised while turning a policy descriptor into a runtime policy.
///
/// These are build-time failures: they abort route construction and never
/// surface at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Unsupported policy type '{tag}'")]
    UnknownPolicy { tag: String },

    #[error("Policy '{policy}' requires parameter '{parameter}'")]
    MissingParameter { policy: String, parameter: String },

    #[error("Invalid value for '{parameter}' on policy '{policy}': {message}")]
    InvalidParameter {
        policy: String,
        parameter: String,
        message: String,
    },

    #[error("Policy '{policy}' has a total weight of zero")]
    ZeroTotalWeight { policy: String },

    #[error("Policy '{policy}' declares {weights} weights for {destinations} destinations")]
    WeightCountMismatch {
        policy: String,
        weights: usize,
        destinations: usize,
    },

    #[error("Policy '{policy}' reference could not be resolved: {source}")]
    Lookup {
        policy: String,
        #[source]
        source: LookupError,
    },
}

impl ConfigurationError {
    pub(crate) fn invalid(policy: &str, parameter: &str, message: impl Into<String>) -> Self {
        ConfigurationError::InvalidParameter {
            policy: policy.to_string(),
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(policy: &str, parameter: &str) -> Self {
        ConfigurationError::MissingParameter {
            policy: policy.to_string(),
            parameter: parameter.to_string(),
        }
    }
}
