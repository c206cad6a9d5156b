//! Routes built from configuration files

mod common;

use common::write_config;
use relay::config::{ConfigError, RelayConfig};
use relay::dispatch::{DispatchError, SimulatedSender};
use relay::exchange::Exchange;
use relay::factory::{ConfigurationError, LookupError, NamedRegistry, PolicyFactory};
use relay::policy::{
    RetryState, Selection, SelectionError, SelectionPolicy, TopicPolicy,
};
use relay::registry::Destination;
use relay::route::{RouteError, RouteSet};
use std::sync::Arc;

const ROUTES: &str = r#"
[dispatch]
send_timeout_ms = 1000

[[routes]]
name = "orders"
destinations = ["mock:a", "mock:b", "mock:c"]

[routes.policy]
type = "failover"
exceptions = "io"
round_robin = true

[[routes]]
name = "tenants"
destinations = ["mock:t1", "mock:t2"]

[routes.policy]
type = "customLoadBalancer"
ref = "last-wins"
"#;

/// Always picks the last candidate
#[derive(Debug)]
struct LastWins;

impl SelectionPolicy for LastWins {
    fn name(&self) -> &str {
        "last-wins"
    }

    fn choose(
        &self,
        candidates: &[Destination],
        _exchange: &Exchange,
        _retry: &mut RetryState,
    ) -> Result<Selection, SelectionError> {
        candidates
            .last()
            .cloned()
            .map(Selection::One)
            .ok_or(SelectionError::NoCandidates)
    }
}

fn load(content: &str) -> RelayConfig {
    let file = write_config(content);
    let config = RelayConfig::load(Some(file.path())).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_routes_from_config_with_custom_reference() {
    let config = load(ROUTES);
    let lookup = NamedRegistry::new();
    lookup.bind_policy("last-wins", Arc::new(LastWins));
    let sender = Arc::new(SimulatedSender::new());

    let routes =
        RouteSet::from_config(&config, &PolicyFactory::default(), &lookup, sender.clone()).unwrap();
    assert_eq!(routes.names(), vec!["orders", "tenants"]);

    let tenants = routes.route("tenants").unwrap();
    assert_eq!(tenants.policy_name(), "last-wins");
    for _ in 0..3 {
        tenants.dispatch(&Exchange::new()).await.unwrap();
    }
    assert_eq!(sender.delivered("mock:t2"), 3);
}

#[test]
fn test_unresolvable_custom_reference_fails_at_build() {
    let config = load(ROUTES);
    let err = RouteSet::from_config(
        &config,
        &PolicyFactory::default(),
        &NamedRegistry::new(),
        Arc::new(SimulatedSender::new()),
    )
    .unwrap_err();

    assert_eq!(
        err,
        RouteError::Configuration {
            route: "tenants".to_string(),
            source: ConfigurationError::Lookup {
                policy: "custom".to_string(),
                source: LookupError::ReferenceNotFound("last-wins".to_string()),
            },
        }
    );
}

#[test]
fn test_wrong_type_bound_under_reference() {
    let config = load(ROUTES);
    let lookup = NamedRegistry::new();
    lookup.bind("last-wins", "not a policy".to_string());

    let err = RouteSet::from_config(
        &config,
        &PolicyFactory::default(),
        &lookup,
        Arc::new(SimulatedSender::new()),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RouteError::Configuration {
            source: ConfigurationError::Lookup {
                source: LookupError::TypeMismatch { .. },
                ..
            },
            ..
        }
    ));
}

#[test]
fn test_all_zero_weights_fail_at_build() {
    let config = load(
        r#"
        [[routes]]
        name = "billing"
        destinations = ["mock:a", "mock:b"]

        [routes.policy]
        type = "weighted"
        distribution_ratio = [0, 0]
        "#,
    );
    let err = RouteSet::from_config(
        &config,
        &PolicyFactory::default(),
        &NamedRegistry::new(),
        Arc::new(SimulatedSender::new()),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RouteError::Configuration {
            source: ConfigurationError::ZeroTotalWeight { .. },
            ..
        }
    ));
}

#[test]
fn test_registered_policy_type_usable_from_config() {
    let config = load(
        r#"
        [[routes]]
        name = "fanout"
        destinations = ["mock:a", "mock:b"]

        [routes.policy]
        type = "everyone"
        "#,
    );

    let mut factory = PolicyFactory::default();
    assert!(factory
        .register("everyone", |_, _| {
            Ok(Arc::new(TopicPolicy::new()) as Arc<dyn SelectionPolicy>)
        })
        .is_none());

    let routes = RouteSet::from_config(
        &config,
        &factory,
        &NamedRegistry::new(),
        Arc::new(SimulatedSender::new()),
    )
    .unwrap();
    assert_eq!(routes.route("fanout").unwrap().policy_name(), "topic");
}

#[tokio::test]
async fn test_stop_all_rejects_dispatch() {
    let config = load(
        r#"
        [[routes]]
        name = "orders"
        destinations = ["mock:a"]
        "#,
    );
    let routes = RouteSet::from_config(
        &config,
        &PolicyFactory::default(),
        &NamedRegistry::new(),
        Arc::new(SimulatedSender::new()),
    )
    .unwrap();

    routes.stop_all();
    let err = routes
        .route("orders")
        .unwrap()
        .dispatch(&Exchange::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RouteStopped { .. }));
}

#[test]
fn test_example_config_builds() {
    let config = load(include_str!("../relay.example.toml"));
    let routes = RouteSet::from_config(
        &config,
        &PolicyFactory::default(),
        &NamedRegistry::new(),
        Arc::new(SimulatedSender::new()),
    )
    .unwrap();
    assert_eq!(routes.len(), config.routes.len());
}

#[test]
fn test_unknown_route_lookup() {
    let config = load(ROUTES);
    assert!(matches!(
        config.route("nope"),
        Err(ConfigError::UnknownRoute(_))
    ));
}
