//! Built-in policy type tags

use std::str::FromStr;

/// Policy type tag of a built-in selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Rotate through destinations in registry order
    RoundRobin,

    /// Uniformly random destination
    Random,

    /// Same destination for the same correlation key
    Sticky,

    /// Proportional to configured weights
    Weighted,

    /// Next destination on failure
    Failover,

    /// Every destination
    Topic,

    /// User-supplied policy resolved by reference
    Custom,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 7] = [
        PolicyKind::RoundRobin,
        PolicyKind::Random,
        PolicyKind::Sticky,
        PolicyKind::Weighted,
        PolicyKind::Failover,
        PolicyKind::Topic,
        PolicyKind::Custom,
    ];

    /// Canonical tag
    pub fn tag(&self) -> &'static str {
        match self {
            PolicyKind::RoundRobin => "round-robin",
            PolicyKind::Random => "random",
            PolicyKind::Sticky => "sticky",
            PolicyKind::Weighted => "weighted",
            PolicyKind::Failover => "failover",
            PolicyKind::Topic => "topic",
            PolicyKind::Custom => "custom",
        }
    }
}

/// Normalize a tag: lowercase, `_` and `-` equivalent, camel-case aliases folded.
pub fn normalize_tag(tag: &str) -> String {
    match tag.trim() {
        "roundRobin" => "round-robin".to_string(),
        "customLoadBalancer" => "custom".to_string(),
        other => other.to_lowercase().replace('_', "-"),
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = normalize_tag(s);
        PolicyKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| format!("Unknown policy type: {}", s))
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
