//! Unit of work being dispatched.
//!
//! An [`Exchange`] carries the headers and body of one in-flight message,
//! plus a unique id used for correlation in logs and reports.

mod expression;

pub use expression::{KeyExpression, SelectionKeyError};

use std::collections::HashMap;
use uuid::Uuid;

/// The in-flight message being routed.
///
/// # Examples
///
/// ```
/// use relay::exchange::Exchange;
///
/// let exchange = Exchange::new()
///     .with_header("customer", "acme")
///     .with_body("hello");
/// assert_eq!(exchange.header("customer"), Some("acme"));
/// assert_eq!(exchange.body(), b"hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    id: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Exchange {
    /// Create an empty exchange with a fresh UUID v4 id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Create an empty exchange with a caller-supplied id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_exchange_has_uuid_id() {
        let exchange = Exchange::new();
        assert_eq!(exchange.id().len(), 36);
        assert!(Uuid::parse_str(exchange.id()).is_ok());
    }

    #[test]
    fn test_exchange_ids_are_unique() {
        assert_ne!(Exchange::new().id(), Exchange::new().id());
    }

    #[test]
    fn test_header_missing_is_none() {
        let exchange = Exchange::with_id("x").with_header("a", "1");
        assert_eq!(exchange.header("a"), Some("1"));
        assert_eq!(exchange.header("b"), None);
        assert_eq!(exchange.headers().len(), 1);
    }
}
