/// Errors that can occur during registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("destination already registered: {0}")]
    DuplicateDestination(String),

    #[error("destination not found: {0}")]
    DestinationNotFound(String),

    #[error("invalid destination uri: '{0}'")]
    InvalidUri(String),
}
