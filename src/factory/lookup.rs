//! Named-object lookup used to resolve custom policies

use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::LookupError;
use crate::policy::SelectionPolicy;

/// A type-erased object bound in a lookup registry
pub type NamedObject = Arc<dyn Any + Send + Sync>;

/// Resolves names to objects supplied by the surrounding application.
pub trait Lookup: Send + Sync {
    /// Return the object bound to `name`.
    fn resolve(&self, name: &str) -> Result<NamedObject, LookupError>;
}

/// In-memory [`Lookup`] implementation.
///
/// # Examples
///
/// ```
/// use relay::factory::{resolve_policy, NamedRegistry};
/// use relay::policy::{RandomPolicy, SelectionPolicy};
/// use std::sync::Arc;
///
/// let registry = NamedRegistry::new();
/// registry.bind_policy("mine", Arc::new(RandomPolicy::new()));
///
/// let policy = resolve_policy(&registry, "mine").unwrap();
/// assert_eq!(policy.name(), "random");
/// ```
#[derive(Default)]
pub struct NamedRegistry {
    objects: DashMap<String, NamedObject>,
}

impl NamedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an arbitrary object, replacing any previous binding.
    pub fn bind<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
        self.objects.insert(name.into(), Arc::new(value));
    }

    /// Bind a selection policy so it can be referenced by a custom descriptor.
    pub fn bind_policy(&self, name: impl Into<String>, policy: Arc<dyn SelectionPolicy>) {
        self.bind(name, policy);
    }

    pub fn unbind(&self, name: &str) -> bool {
        self.objects.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Lookup for NamedRegistry {
    fn resolve(&self, name: &str) -> Result<NamedObject, LookupError> {
        self.objects
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LookupError::ReferenceNotFound(name.to_string()))
    }
}

impl fmt::Debug for NamedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("NamedRegistry").field("names", &names).finish()
    }
}

/// Resolve `name` and check that it is a selection policy.
pub fn resolve_policy(
    lookup: &dyn Lookup,
    name: &str,
) -> Result<Arc<dyn SelectionPolicy>, LookupError> {
    let object = lookup.resolve(name)?;
    object
        .downcast_ref::<Arc<dyn SelectionPolicy>>()
        .cloned()
        .ok_or_else(|| LookupError::TypeMismatch {
            name: name.to_string(),
            expected: "selection policy",
        })
}
