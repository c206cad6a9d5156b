use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::RegistryError;

/// An addressable send target.
///
/// Destinations are immutable values identified by their URI. Cloning is
/// cheap: the URI is shared behind an `Arc`.
///
/// # Examples
///
/// ```
/// use relay::registry::Destination;
///
/// let destination = Destination::new("direct:orders").unwrap();
/// assert_eq!(destination.uri(), "direct:orders");
/// assert!(Destination::new("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Destination {
    uri: Arc<str>,
}

impl Destination {
    /// Create a destination, rejecting empty or whitespace-only URIs.
    pub fn new(uri: impl Into<String>) -> Result<Self, RegistryError> {
        let uri = uri.into();
        let trimmed = uri.trim();
        if trimmed.is_empty() {
            return Err(RegistryError::InvalidUri(uri));
        }
        Ok(Self {
            uri: Arc::from(trimmed),
        })
    }

    /// The URI identifying this destination.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl TryFrom<String> for Destination {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Destination::new(value)
    }
}

impl From<Destination> for String {
    fn from(destination: Destination) -> Self {
        destination.uri.to_string()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Destination({})", self.uri)
    }
}
