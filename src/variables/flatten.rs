//! Flattening of variable trees into process environment pairs
//!
//! A mapping yields both a JSON blob under its own name and one entry per
//! child, so a shell step can read either `USER` as JSON or `USER_NAME` as
//! a plain value. Lists yield one index-keyed entry per element and
//! scalars yield their plain string form.

use serde_json::Value;
use std::fmt;
use tracing::debug;

/// A single `NAME=value` environment entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvPair {
    pub key: String,
    pub value: String,
}

impl EnvPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for EnvPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Normalize a variable name into environment form
pub(crate) fn env_key(name: &str) -> String {
    name.replace('-', "_").to_uppercase()
}

/// Flatten `value` under `namespace`
///
/// Pairs are returned in emission order. When the same key appears twice
/// (a scalar's JSON form followed by its plain form) the later entry wins
/// once applied to a process environment.
pub fn flatten(namespace: &str, value: &Value) -> Vec<EnvPair> {
    let namespace = namespace.to_uppercase();
    let mut pairs = Vec::new();

    match serde_json::to_string(value) {
        Ok(json) => pairs.push(EnvPair::new(namespace.as_str(), json)),
        Err(e) => debug!("could not serialize variables under {}: {}", namespace, e),
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_namespace = format!("{}_{}", namespace, env_key(key));
                pairs.extend(flatten(&child_namespace, child));
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                pairs.push(EnvPair::new(
                    format!("{}_{}", namespace, index),
                    natural_string(item),
                ));
            }
        }
        scalar => pairs.push(EnvPair::new(namespace, natural_string(scalar))),
    }

    pairs
}

/// Plain string form of a value
///
/// Strings are unquoted and null is empty. Nested lists and mappings that
/// reach this point (list elements) are rendered as compact JSON.
pub fn natural_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        composite => composite.to_string(),
    }
}
