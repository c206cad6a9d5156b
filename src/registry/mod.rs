//! Destination Registry module.
//!
//! Holds the ordered, possibly-changing list of candidate destinations for a
//! single dispatch point.

mod destination;
mod error;

pub use destination::*;
pub use error::*;

use arc_swap::ArcSwap;
use std::sync::Arc;

/// The Destination Registry stores the candidates of one dispatch point.
///
/// Order is significant: round-robin, weighted and failover selection index
/// into it. Readers take an immutable snapshot; writers publish a complete new
/// list, so an in-flight selection never observes a half-applied update.
///
/// # Examples
///
/// ```
/// use relay::registry::{Destination, DestinationRegistry};
///
/// let registry = DestinationRegistry::new();
/// registry.add(Destination::new("direct:a").unwrap()).unwrap();
/// registry.add(Destination::new("direct:b").unwrap()).unwrap();
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot.len(), 2);
/// assert_eq!(snapshot[0].uri(), "direct:a");
/// ```
#[derive(Debug)]
pub struct DestinationRegistry {
    destinations: ArcSwap<Vec<Destination>>,
}

impl DestinationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            destinations: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Create a registry from an initial ordered list.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateDestination` if the list names the same
    /// destination twice.
    pub fn with_destinations(destinations: Vec<Destination>) -> Result<Self, RegistryError> {
        check_unique(&destinations)?;
        Ok(Self {
            destinations: ArcSwap::from_pointee(destinations),
        })
    }

    /// Read-only snapshot of the current list.
    ///
    /// The snapshot stays valid and unchanged for as long as the caller holds
    /// it, regardless of concurrent mutation.
    pub fn snapshot(&self) -> Arc<Vec<Destination>> {
        self.destinations.load_full()
    }

    /// Owned copy of the current list.
    pub fn list(&self) -> Vec<Destination> {
        self.destinations.load().as_ref().clone()
    }

    /// Number of registered destinations.
    pub fn size(&self) -> usize {
        self.destinations.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether the destination with the given URI is registered.
    pub fn contains(&self, uri: &str) -> bool {
        self.destinations.load().iter().any(|d| d.uri() == uri)
    }

    /// Append a destination at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateDestination` if it is already registered.
    pub fn add(&self, destination: Destination) -> Result<(), RegistryError> {
        let mut outcome = Ok(());
        self.destinations.rcu(|current| {
            if current.contains(&destination) {
                outcome = Err(RegistryError::DuplicateDestination(
                    destination.uri().to_string(),
                ));
                return Arc::clone(current);
            }
            outcome = Ok(());
            let mut next = current.as_ref().clone();
            next.push(destination.clone());
            Arc::new(next)
        });

        if outcome.is_ok() {
            tracing::debug!(destination = %destination, "Destination registered");
        }
        outcome
    }

    /// Remove a destination, preserving the order of the remaining ones.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DestinationNotFound` if no destination has this URI.
    pub fn remove(&self, uri: &str) -> Result<Destination, RegistryError> {
        let mut removed = None;
        self.destinations.rcu(|current| {
            removed = current.iter().find(|d| d.uri() == uri).cloned();
            if removed.is_none() {
                return Arc::clone(current);
            }
            Arc::new(
                current
                    .iter()
                    .filter(|d| d.uri() != uri)
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        });

        match removed {
            Some(destination) => {
                tracing::debug!(destination = %destination, "Destination removed");
                Ok(destination)
            }
            None => Err(RegistryError::DestinationNotFound(uri.to_string())),
        }
    }

    /// Atomically replace the whole list (e.g. after service discovery).
    pub fn replace(&self, destinations: Vec<Destination>) -> Result<(), RegistryError> {
        check_unique(&destinations)?;
        let count = destinations.len();
        self.destinations.store(Arc::new(destinations));
        tracing::debug!(count, "Destination list replaced");
        Ok(())
    }
}

impl Default for DestinationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_unique(destinations: &[Destination]) -> Result<(), RegistryError> {
    let mut seen = std::collections::HashSet::with_capacity(destinations.len());
    for destination in destinations {
        if !seen.insert(destination.uri()) {
            return Err(RegistryError::DuplicateDestination(
                destination.uri().to_string(),
            ));
        }
    }
    Ok(())
}
