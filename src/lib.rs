//! Relay - load-balancing destination selection and dispatch
//!
//! A route owns an ordered [`registry::DestinationRegistry`] and a
//! [`policy::SelectionPolicy`] built by the [`factory::PolicyFactory`] from a
//! declarative [`factory::PolicyDescriptor`]. The [`dispatch::Dispatcher`]
//! asks the policy for destination(s), sends the [`exchange::Exchange`]
//! through a [`dispatch::Sender`] and fails over when the policy allows it.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod exchange;
pub mod factory;
pub mod logging;
pub mod policy;
pub mod registry;
pub mod route;
