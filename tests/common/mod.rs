//! Shared helpers for relay integration tests.

#![allow(dead_code)]

use relay::dispatch::{Dispatcher, SendError, SimulatedSender};
use relay::factory::{NamedRegistry, PolicyDescriptor, PolicyFactory};
use relay::policy::SelectionPolicy;
use relay::registry::{Destination, DestinationRegistry};
use std::sync::Arc;

/// UUID v4 string length: "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
pub const UUID_V4_STRING_LEN: usize = 36;

pub fn dest(uri: &str) -> Destination {
    Destination::new(uri).unwrap()
}

/// `count` destinations named `mock:0`, `mock:1`, ...
pub fn numbered(count: usize) -> Vec<Destination> {
    (0..count).map(|i| dest(&format!("mock:{}", i))).collect()
}

pub fn registry(uris: &[&str]) -> Arc<DestinationRegistry> {
    Arc::new(
        DestinationRegistry::with_destinations(uris.iter().map(|u| dest(u)).collect()).unwrap(),
    )
}

/// Build a policy from a descriptor with the default factory and an empty lookup.
pub fn build_policy(descriptor: &PolicyDescriptor, destinations: usize) -> Arc<dyn SelectionPolicy> {
    PolicyFactory::default()
        .build_for(descriptor, &NamedRegistry::new(), destinations)
        .unwrap()
}

/// A dispatcher over `uris` using a policy built from `descriptor`.
pub fn dispatcher(
    uris: &[&str],
    descriptor: &PolicyDescriptor,
    sender: Arc<SimulatedSender>,
) -> Dispatcher {
    Dispatcher::new(
        "test-route",
        registry(uris),
        build_policy(descriptor, uris.len()),
        sender,
    )
}

/// A sender on which every listed destination fails with `kind`.
pub fn failing_sender(uris: &[&str], kind: &str) -> Arc<SimulatedSender> {
    let sender = Arc::new(SimulatedSender::new());
    for uri in uris {
        sender.fail(*uri, SendError::new(kind, format!("{} unavailable", uri)));
    }
    sender
}

/// Write `content` to a temporary TOML file.
pub fn write_config(content: &str) -> tempfile::NamedTempFile {
    let temp = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    std::fs::write(temp.path(), content).unwrap();
    temp
}
