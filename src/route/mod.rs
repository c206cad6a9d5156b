//! Routes: named dispatch points wiring a registry, a policy and a sender
//!
//! All selection state (round-robin cursors, sticky bindings) lives inside
//! the route's policy instance. Two routes never share it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub mod error;

pub use error::RouteError;

use crate::config::{RelayConfig, RouteConfig};
use crate::dispatch::{DispatchError, DispatchReport, Dispatcher, Sender};
use crate::exchange::Exchange;
use crate::factory::{Lookup, PolicyFactory};
use crate::registry::{Destination, DestinationRegistry};

/// A running dispatch point
#[derive(Debug)]
pub struct Route {
    name: String,
    dispatcher: Dispatcher,
    running: AtomicBool,
}

impl Route {
    /// Build a route from its configuration.
    ///
    /// Policy descriptors are validated here; a bad descriptor aborts the
    /// build with [`RouteError::Configuration`]. The route starts running.
    pub fn build(
        config: &RouteConfig,
        factory: &PolicyFactory,
        lookup: &dyn Lookup,
        sender: Arc<dyn Sender>,
        send_timeout: Option<Duration>,
    ) -> Result<Self, RouteError> {
        let registry_error = |source| RouteError::Registry {
            route: config.name.clone(),
            source,
        };

        let destinations = config
            .destinations
            .iter()
            .map(Destination::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(registry_error)?;
        let registry =
            DestinationRegistry::with_destinations(destinations).map_err(registry_error)?;

        let policy = factory
            .build_for(&config.policy, lookup, registry.size())
            .map_err(|source| RouteError::Configuration {
                route: config.name.clone(),
                source,
            })?;

        let mut dispatcher =
            Dispatcher::new(config.name.clone(), Arc::new(registry), policy, sender);
        if let Some(timeout) = send_timeout {
            dispatcher = dispatcher.with_send_timeout(timeout);
        }

        tracing::info!(
            route = %config.name,
            policy = dispatcher.policy().name(),
            destinations = dispatcher.registry().size(),
            "Route built"
        );

        Ok(Self {
            name: config.name.clone(),
            dispatcher,
            running: AtomicBool::new(true),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The route's live destination registry
    pub fn registry(&self) -> &Arc<DestinationRegistry> {
        self.dispatcher.registry()
    }

    pub fn policy_name(&self) -> &str {
        self.dispatcher.policy().name()
    }

    pub fn start(&self) {
        if !self.running.swap(true, Ordering::SeqCst) {
            tracing::info!(route = %self.name, "Route started");
        }
    }

    /// Stop accepting exchanges. In-flight dispatches run to completion.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!(route = %self.name, "Route stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn dispatch(&self, exchange: &Exchange) -> Result<DispatchReport, DispatchError> {
        if !self.is_running() {
            return Err(DispatchError::RouteStopped {
                route: self.name.clone(),
            });
        }
        self.dispatcher.dispatch(exchange).await
    }
}

/// Every route declared in a configuration, in declaration order
#[derive(Debug, Default)]
pub struct RouteSet {
    routes: Vec<Arc<Route>>,
}

impl RouteSet {
    /// Build every route in `config`, failing on the first bad one.
    pub fn from_config(
        config: &RelayConfig,
        factory: &PolicyFactory,
        lookup: &dyn Lookup,
        sender: Arc<dyn Sender>,
    ) -> Result<Self, RouteError> {
        let timeout = config.dispatch.send_timeout();
        let mut set = Self::default();
        for route_config in &config.routes {
            let route = Route::build(route_config, factory, lookup, Arc::clone(&sender), timeout)?;
            set.insert(route)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, route: Route) -> Result<(), RouteError> {
        if self.route(route.name()).is_some() {
            return Err(RouteError::DuplicateRoute(route.name().to_string()));
        }
        self.routes.push(Arc::new(route));
        Ok(())
    }

    pub fn route(&self, name: &str) -> Option<&Arc<Route>> {
        self.routes.iter().find(|route| route.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.routes.iter().map(|route| route.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn stop_all(&self) {
        for route in &self.routes {
            route.stop();
        }
    }
}
