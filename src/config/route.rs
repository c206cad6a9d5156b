//! Route configuration

use serde::{Deserialize, Serialize};

use crate::factory::PolicyDescriptor;

/// One dispatch point: a named destination list and its selection policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default = "default_policy")]
    pub policy: PolicyDescriptor,
}

fn default_policy() -> PolicyDescriptor {
    PolicyDescriptor::new("round-robin")
}

impl RouteConfig {
    pub fn new(name: impl Into<String>, destinations: Vec<String>, policy: PolicyDescriptor) -> Self {
        Self {
            name: name.into(),
            destinations,
            policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ParamValue;

    #[test]
    fn test_route_defaults_to_round_robin() {
        let toml = r#"
        name = "orders"
        destinations = ["mock:a", "mock:b"]
        "#;
        let route: RouteConfig = toml::from_str(toml).unwrap();
        assert_eq!(route.policy.kind(), "round-robin");
        assert_eq!(route.destinations.len(), 2);
    }

    #[test]
    fn test_route_with_policy_table() {
        let toml = r#"
        name = "billing"
        destinations = ["mock:a", "mock:b"]

        [policy]
        type = "weighted"
        distribution_ratio = "3,1"
        round_robin = true
        "#;
        let route: RouteConfig = toml::from_str(toml).unwrap();
        assert_eq!(route.policy.kind(), "weighted");
        assert_eq!(route.policy.get("round_robin"), Some(&ParamValue::Bool(true)));
    }
}
