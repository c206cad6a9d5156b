//! End-to-end dispatch behavior across policies

mod common;

use common::{dest, dispatcher, failing_sender, UUID_V4_STRING_LEN};
use relay::dispatch::{DispatchError, DispatchState, Dispatcher, SendError, SimulatedSender};
use relay::exchange::Exchange;
use relay::factory::PolicyDescriptor;
use relay::policy::RoundRobinPolicy;
use relay::registry::DestinationRegistry;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_empty_registry_fails_without_sending() {
    let sender = Arc::new(SimulatedSender::new());
    let dispatcher = dispatcher(&[], &PolicyDescriptor::new("random"), sender.clone());

    let err = dispatcher.dispatch(&Exchange::new()).await.unwrap_err();
    assert!(matches!(err, DispatchError::NoDestinationsAvailable { .. }));
    assert_eq!(sender.total_attempts(), 0);
}

#[tokio::test]
async fn test_failover_exhaustion_attempts_each_destination_once() {
    for n in 1..=6usize {
        let uris: Vec<String> = (0..n).map(|i| format!("mock:{}", i)).collect();
        let refs: Vec<&str> = uris.iter().map(String::as_str).collect();
        let sender = failing_sender(&refs, "io.connect");
        let descriptor = PolicyDescriptor::new("failover").with("exceptions", vec!["io"]);
        let dispatcher = dispatcher(&refs, &descriptor, sender.clone());

        let err = dispatcher.dispatch(&Exchange::new()).await.unwrap_err();
        match err {
            DispatchError::AllDestinationsFailed { attempts, last } => {
                assert_eq!(attempts, n);
                assert_eq!(last.kind(), "io.connect");
            }
            other => panic!("Expected AllDestinationsFailed, got {:?}", other),
        }
        for uri in &refs {
            assert_eq!(sender.attempts(uri), 1, "destination {} of {}", uri, n);
        }
    }
}

#[tokio::test]
async fn test_failover_zero_attempts_means_single_send() {
    let sender = failing_sender(&["mock:a", "mock:b"], "io");
    let descriptor = PolicyDescriptor::new("failover").with("maximum_failover_attempts", 0);
    let dispatcher = dispatcher(&["mock:a", "mock:b"], &descriptor, sender.clone());

    let err = dispatcher.dispatch(&Exchange::new()).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::AllDestinationsFailed { attempts: 1, .. }
    ));
    assert_eq!(sender.total_attempts(), 1);
}

#[tokio::test]
async fn test_failover_round_robin_spreads_first_attempts() {
    let sender = Arc::new(SimulatedSender::new());
    let descriptor = PolicyDescriptor::new("failover").with("round_robin", true);
    let dispatcher = dispatcher(&["mock:a", "mock:b", "mock:c"], &descriptor, sender.clone());

    for _ in 0..6 {
        dispatcher.dispatch(&Exchange::new()).await.unwrap();
    }
    for uri in ["mock:a", "mock:b", "mock:c"] {
        assert_eq!(sender.delivered(uri), 2);
    }
}

#[tokio::test]
async fn test_failover_sticky_remembers_last_good() {
    let sender = failing_sender(&["mock:a"], "io");
    let descriptor = PolicyDescriptor::new("failover").with("sticky", true);
    let dispatcher = dispatcher(&["mock:a", "mock:b", "mock:c"], &descriptor, sender.clone());

    dispatcher.dispatch(&Exchange::new()).await.unwrap();
    dispatcher.dispatch(&Exchange::new()).await.unwrap();

    assert_eq!(sender.attempts("mock:a"), 1);
    assert_eq!(sender.delivered("mock:b"), 2);
}

#[tokio::test]
async fn test_timeout_is_retried_as_failover() {
    let sender = Arc::new(SimulatedSender::new());
    sender.delay("mock:slow", Duration::from_millis(250));
    let descriptor = PolicyDescriptor::new("failover").with("exceptions", vec!["timeout"]);
    let dispatcher = dispatcher(&["mock:slow", "mock:fast"], &descriptor, sender.clone())
        .with_send_timeout(Duration::from_millis(25));

    let report = dispatcher.dispatch(&Exchange::new()).await.unwrap();
    assert_eq!(report.delivered_to, vec![dest("mock:fast")]);
    assert_eq!(report.final_state(), Some(DispatchState::Success));
}

#[tokio::test]
async fn test_topic_delivers_to_every_destination() {
    let sender = failing_sender(&["mock:b"], "io");
    let dispatcher = dispatcher(
        &["mock:a", "mock:b", "mock:c"],
        &PolicyDescriptor::new("topic"),
        sender.clone(),
    );

    let err = dispatcher.dispatch(&Exchange::new()).await.unwrap_err();
    assert!(matches!(err, DispatchError::BroadcastFailed { ref failures, .. } if failures.len() == 1));
    assert_eq!(sender.delivered("mock:a"), 1);
    assert_eq!(sender.delivered("mock:c"), 1);

    sender.recover("mock:b");
    let report = dispatcher.dispatch(&Exchange::new()).await.unwrap();
    assert_eq!(report.delivered_to.len(), 3);
}

#[tokio::test]
async fn test_sticky_routes_same_key_to_same_destination() {
    let sender = Arc::new(SimulatedSender::new());
    let descriptor =
        PolicyDescriptor::new("sticky").with("correlation_expression", "${header.tenant}");
    let dispatcher = dispatcher(&["mock:a", "mock:b", "mock:c"], &descriptor, sender.clone());

    let mut chosen = Vec::new();
    for _ in 0..5 {
        let exchange = Exchange::new().with_header("tenant", "acme");
        let report = dispatcher.dispatch(&exchange).await.unwrap();
        chosen.push(report.delivered_to[0].clone());
    }
    assert!(chosen.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_sticky_rebinds_after_destination_removed() {
    let registry = Arc::new(
        DestinationRegistry::with_destinations(vec![dest("mock:a"), dest("mock:b")]).unwrap(),
    );
    let policy = common::build_policy(
        &PolicyDescriptor::new("sticky").with("correlation_expression", "body"),
        2,
    );
    let sender = Arc::new(SimulatedSender::new());
    let dispatcher = Dispatcher::new("sessions", registry.clone(), policy, sender.clone());

    let exchange = Exchange::new().with_body("order-1");
    let first = dispatcher.dispatch(&exchange).await.unwrap().delivered_to[0].clone();

    registry.remove(first.uri()).unwrap();
    let second = dispatcher.dispatch(&exchange).await.unwrap().delivered_to[0].clone();
    assert_ne!(first, second);

    let third = dispatcher.dispatch(&exchange).await.unwrap().delivered_to[0].clone();
    assert_eq!(second, third);
}

#[tokio::test]
async fn test_weighted_zero_weight_never_receives() {
    let sender = Arc::new(SimulatedSender::new());
    let descriptor = PolicyDescriptor::new("weighted").with("distribution_ratio", "1,0,1");
    let dispatcher = dispatcher(&["mock:a", "mock:b", "mock:c"], &descriptor, sender.clone());

    for _ in 0..300 {
        dispatcher.dispatch(&Exchange::new()).await.unwrap();
    }
    assert_eq!(sender.attempts("mock:b"), 0);
    assert_eq!(sender.delivered("mock:a") + sender.delivered("mock:c"), 300);
}

#[tokio::test]
async fn test_registry_growth_is_seen_by_next_dispatch() {
    let registry = Arc::new(DestinationRegistry::with_destinations(vec![dest("mock:a")]).unwrap());
    let sender = Arc::new(SimulatedSender::new());
    let dispatcher = Dispatcher::new(
        "growing",
        registry.clone(),
        Arc::new(RoundRobinPolicy::new()),
        sender.clone(),
    );

    dispatcher.dispatch(&Exchange::new()).await.unwrap();
    registry.add(dest("mock:b")).unwrap();
    dispatcher.dispatch(&Exchange::new()).await.unwrap();

    assert_eq!(sender.delivered("mock:a"), 1);
    assert_eq!(sender.delivered("mock:b"), 1);
}

#[tokio::test]
async fn test_report_carries_generated_exchange_id() {
    let sender = Arc::new(SimulatedSender::new());
    let dispatcher = dispatcher(&["mock:a"], &PolicyDescriptor::new("round-robin"), sender);

    let exchange = Exchange::new();
    let report = dispatcher.dispatch(&exchange).await.unwrap();
    assert_eq!(report.exchange_id.len(), UUID_V4_STRING_LEN);
    assert_eq!(report.exchange_id, exchange.id());
    assert_eq!(report.route, "test-route");
}

#[tokio::test]
async fn test_concurrent_dispatch_round_robin_is_exact() {
    let sender = Arc::new(SimulatedSender::new());
    let dispatcher = Arc::new(dispatcher(
        &["mock:a", "mock:b", "mock:c", "mock:d"],
        &PolicyDescriptor::new("round-robin"),
        sender.clone(),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(tokio::spawn(async move {
            for _ in 0..125 {
                dispatcher.dispatch(&Exchange::new()).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for uri in ["mock:a", "mock:b", "mock:c", "mock:d"] {
        assert_eq!(sender.delivered(uri), 250);
    }
}

#[tokio::test]
async fn test_non_triggering_error_surfaces_unchanged() {
    let sender = Arc::new(SimulatedSender::new());
    sender.fail("mock:a", SendError::new("validation", "schema mismatch"));
    let descriptor = PolicyDescriptor::new("failover").with("exceptions", "io,timeout");
    let dispatcher = dispatcher(&["mock:a", "mock:b"], &descriptor, sender.clone());

    let err = dispatcher.dispatch(&Exchange::new()).await.unwrap_err();
    match err {
        DispatchError::SendFailed { destination, source } => {
            assert_eq!(destination, dest("mock:a"));
            assert_eq!(source.kind(), "validation");
        }
        other => panic!("Expected SendFailed, got {:?}", other),
    }
    assert_eq!(sender.attempts("mock:b"), 0);
}
