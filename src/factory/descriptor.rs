//! Declarative policy descriptors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::ConfigurationError;
use crate::policy::SelectionPolicy;

/// A descriptor parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<ParamValue>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Declarative configuration of a selection policy: a type tag plus named
/// parameters.
///
/// Descriptors are values. Variants are derived with [`with`](Self::with)
/// and [`with_instance`](Self::with_instance), which return a new descriptor
/// and leave the original untouched.
///
/// # Examples
///
/// ```
/// use relay::factory::PolicyDescriptor;
///
/// let base = PolicyDescriptor::new("failover");
/// let tuned = base
///     .clone()
///     .with("round_robin", true)
///     .with("exceptions", vec!["io", "timeout"]);
///
/// assert!(base.parameters().is_empty());
/// assert_eq!(tuned.parameters().len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDescriptor {
    #[serde(rename = "type")]
    kind: String,

    #[serde(flatten)]
    parameters: BTreeMap<String, ParamValue>,

    /// Directly supplied custom policy; never serialized
    #[serde(skip)]
    instance: Option<Arc<dyn SelectionPolicy>>,
}

impl PolicyDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            parameters: BTreeMap::new(),
            instance: None,
        }
    }

    /// New descriptor with `name` set to `value`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// New descriptor carrying a direct custom policy instance.
    pub fn with_instance(mut self, policy: Arc<dyn SelectionPolicy>) -> Self {
        self.instance = Some(policy);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    pub fn instance(&self) -> Option<&Arc<dyn SelectionPolicy>> {
        self.instance.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Reject parameters a policy does not understand.
    pub fn ensure_known(&self, policy: &str, allowed: &[&str]) -> Result<(), ConfigurationError> {
        match self
            .parameters
            .keys()
            .find(|name| !allowed.contains(&name.as_str()))
        {
            Some(unknown) => Err(ConfigurationError::invalid(
                policy,
                unknown,
                format!("unknown parameter (expected one of: {})", allowed.join(", ")),
            )),
            None => Ok(()),
        }
    }

    /// Boolean parameter; accepts `true`/`false` strings as well.
    pub fn get_bool(&self, policy: &str, name: &str) -> Result<Option<bool>, ConfigurationError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Bool(b)) => Ok(Some(*b)),
            Some(ParamValue::Text(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(ConfigurationError::invalid(policy, name, "expected a boolean")),
            },
            Some(_) => Err(ConfigurationError::invalid(policy, name, "expected a boolean")),
        }
    }

    /// Integer parameter; accepts numeric strings as well.
    pub fn get_int(&self, policy: &str, name: &str) -> Result<Option<i64>, ConfigurationError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Int(i)) => Ok(Some(*i)),
            Some(ParamValue::Text(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigurationError::invalid(policy, name, "expected an integer")),
            Some(_) => Err(ConfigurationError::invalid(policy, name, "expected an integer")),
        }
    }

    /// String parameter.
    pub fn get_str(&self, policy: &str, name: &str) -> Result<Option<&str>, ConfigurationError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Text(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ConfigurationError::invalid(policy, name, "expected a string")),
        }
    }

    /// List parameter; a string is split on `delimiter`, scalars become
    /// single-element lists. Items are trimmed and blanks dropped.
    pub fn get_list(
        &self,
        policy: &str,
        name: &str,
        delimiter: &str,
    ) -> Result<Option<Vec<String>>, ConfigurationError> {
        let items = match self.get(name) {
            None => return Ok(None),
            Some(ParamValue::Text(s)) => s.split(delimiter).map(str::to_string).collect(),
            Some(ParamValue::Int(i)) => vec![i.to_string()],
            Some(ParamValue::List(values)) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        ParamValue::Text(s) => items.push(s.clone()),
                        ParamValue::Int(i) => items.push(i.to_string()),
                        _ => {
                            return Err(ConfigurationError::invalid(
                                policy,
                                name,
                                "list items must be strings or integers",
                            ))
                        }
                    }
                }
                items
            }
            Some(ParamValue::Bool(_)) => {
                return Err(ConfigurationError::invalid(policy, name, "expected a list"))
            }
        };

        Ok(Some(
            items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        ))
    }
}
