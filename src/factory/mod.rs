//! Policy factory.
//!
//! Turns a [`PolicyDescriptor`] into a runtime [`SelectionPolicy`]. Policy
//! types are looked up in a table of tag → builder functions, so a new type is
//! added by registering a builder; no existing builder or dispatch code
//! changes.
//!
//! # Example
//!
//! ```rust
//! use relay::factory::{NamedRegistry, PolicyDescriptor, PolicyFactory};
//! use relay::policy::SelectionPolicy;
//!
//! let factory = PolicyFactory::default();
//! let lookup = NamedRegistry::new();
//!
//! let descriptor = PolicyDescriptor::new("weighted").with("distribution_ratio", "3,1");
//! let policy = factory.build_for(&descriptor, &lookup, 2).unwrap();
//! assert_eq!(policy.name(), "weighted");
//!
//! let zero = PolicyDescriptor::new("weighted").with("distribution_ratio", "0,0");
//! assert!(factory.build(&zero, &lookup).is_err());
//! ```

mod builders;
pub mod descriptor;
pub mod error;
pub mod lookup;

pub use descriptor::{ParamValue, PolicyDescriptor};
pub use error::{ConfigurationError, LookupError};
pub use lookup::{resolve_policy, Lookup, NamedObject, NamedRegistry};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::policy::kind::normalize_tag;
use crate::policy::{PolicyKind, SelectionPolicy};

/// Builds a policy from its descriptor
pub type PolicyBuilder = Arc<
    dyn Fn(&PolicyDescriptor, &BuildContext<'_>) -> Result<Arc<dyn SelectionPolicy>, ConfigurationError>
        + Send
        + Sync,
>;

/// Collaborators and facts available to a builder
pub struct BuildContext<'a> {
    factory: &'a PolicyFactory,
    lookup: &'a dyn Lookup,
    destination_count: Option<usize>,
}

impl<'a> BuildContext<'a> {
    /// Factory performing the build, for builders that nest other policies
    pub fn factory(&self) -> &'a PolicyFactory {
        self.factory
    }

    pub fn lookup(&self) -> &'a dyn Lookup {
        self.lookup
    }

    /// Number of destinations the policy will select from, when known up front
    pub fn destination_count(&self) -> Option<usize> {
        self.destination_count
    }
}

/// Registry of policy builders keyed by normalized type tag.
pub struct PolicyFactory {
    builders: HashMap<String, PolicyBuilder>,
}

impl PolicyFactory {
    /// A factory with no policy types registered.
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Register (or replace) the builder for `tag`.
    ///
    /// Returns the builder previously registered under that tag, if any.
    pub fn register<F>(&mut self, tag: &str, builder: F) -> Option<PolicyBuilder>
    where
        F: Fn(&PolicyDescriptor, &BuildContext<'_>) -> Result<Arc<dyn SelectionPolicy>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.builders.insert(normalize_tag(tag), Arc::new(builder))
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.builders.contains_key(&normalize_tag(tag))
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.builders.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Build a policy without knowing the destination count up front.
    pub fn build(
        &self,
        descriptor: &PolicyDescriptor,
        lookup: &dyn Lookup,
    ) -> Result<Arc<dyn SelectionPolicy>, ConfigurationError> {
        let ctx = BuildContext {
            factory: self,
            lookup,
            destination_count: None,
        };
        self.build_with(descriptor, &ctx)
    }

    /// Build a policy for a dispatch point with `destination_count` destinations.
    pub fn build_for(
        &self,
        descriptor: &PolicyDescriptor,
        lookup: &dyn Lookup,
        destination_count: usize,
    ) -> Result<Arc<dyn SelectionPolicy>, ConfigurationError> {
        let ctx = BuildContext {
            factory: self,
            lookup,
            destination_count: Some(destination_count),
        };
        self.build_with(descriptor, &ctx)
    }

    /// Build a policy within an existing context.
    pub fn build_with(
        &self,
        descriptor: &PolicyDescriptor,
        ctx: &BuildContext<'_>,
    ) -> Result<Arc<dyn SelectionPolicy>, ConfigurationError> {
        let tag = normalize_tag(descriptor.kind());
        let builder = self
            .builders
            .get(&tag)
            .ok_or_else(|| ConfigurationError::UnknownPolicy {
                tag: descriptor.kind().to_string(),
            })?;

        let policy = builder(descriptor, ctx)?;
        tracing::debug!(policy = %tag, resolved = policy.name(), "Built selection policy");
        Ok(policy)
    }
}

impl Default for PolicyFactory {
    /// A factory with every built-in policy type registered.
    fn default() -> Self {
        let mut factory = Self::empty();
        for kind in PolicyKind::ALL {
            match kind {
                PolicyKind::RoundRobin => factory.register(kind.tag(), builders::round_robin),
                PolicyKind::Random => factory.register(kind.tag(), builders::random),
                PolicyKind::Sticky => factory.register(kind.tag(), builders::sticky),
                PolicyKind::Weighted => factory.register(kind.tag(), builders::weighted),
                PolicyKind::Failover => factory.register(kind.tag(), builders::failover),
                PolicyKind::Topic => factory.register(kind.tag(), builders::topic),
                PolicyKind::Custom => factory.register(kind.tag(), builders::custom),
            };
        }
        factory
    }
}

impl fmt::Debug for PolicyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyFactory")
            .field("tags", &self.tags())
            .finish()
    }
}
