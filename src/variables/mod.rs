//! Variable store for a transaction scope
//!
//! Variables are a JSON-shaped tree keyed by case-preserving names. The
//! store is owned by a single transaction: the step that just finished
//! writes its outputs back, and the next step reads them during template
//! evaluation. There is no internal locking; callers serialize writes.

pub mod flatten;

pub use flatten::{flatten, EnvPair};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Nested variable tree for one transaction scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables {
    raw: Map<String, Value>,
}

impl Variables {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing map as a store
    pub fn from_map(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    /// Build a store holding `values` under a single root key
    ///
    /// Used to expose document variables as `var.*` or a step response as
    /// `response.*`.
    pub fn with_namespace(namespace: impl Into<String>, values: Map<String, Value>) -> Self {
        let mut raw = Map::new();
        raw.insert(namespace.into(), Value::Object(values));
        Self { raw }
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Insert or replace a root entry, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.raw.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Resolve a dotted path such as `var.user.name` or `items.0.id`
    ///
    /// Numeric segments index into lists. Returns `None` when any segment
    /// is missing.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let root = segments.next()?;
        let mut current = self.raw.get(root)?;

        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Layer `other` on top of this store
    ///
    /// Mappings present on both sides are merged recursively; any other
    /// collision is won by `other`.
    pub fn merge(&mut self, other: &Variables) {
        for (key, value) in &other.raw {
            match self.raw.get_mut(key) {
                Some(existing) => merge_value(existing, value),
                None => {
                    self.raw.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Flatten every root key into environment pairs
    ///
    /// Root keys are flattened independently with no shared prefix.
    pub fn flatten(&self) -> Vec<EnvPair> {
        self.raw
            .iter()
            .flat_map(|(key, value)| flatten(&flatten::env_key(key), value))
            .collect()
    }
}

impl From<Map<String, Value>> for Variables {
    fn from(raw: Map<String, Value>) -> Self {
        Self::from_map(raw)
    }
}

fn merge_value(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match target.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, incoming) => *target = incoming.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(value: Value) -> Variables {
        match value {
            Value::Object(map) => Variables::from_map(map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_lookup_nested_paths() {
        let vars = store(json!({
            "var": { "user": { "name": "ada" }, "items": [ { "id": 7 } ] }
        }));

        assert_eq!(vars.lookup("var.user.name"), Some(&json!("ada")));
        assert_eq!(vars.lookup("var.items.0.id"), Some(&json!(7)));
        assert_eq!(vars.lookup("var.items.1"), None);
        assert_eq!(vars.lookup("var.user.name.first"), None);
        assert_eq!(vars.lookup("missing"), None);
    }

    #[test]
    fn test_merge_layers_scopes() {
        let mut base = store(json!({ "var": { "host": "a", "port": 80 } }));
        let step = store(json!({ "var": { "host": "b" }, "response": { "code": 200 } }));

        base.merge(&step);

        assert_eq!(base.lookup("var.host"), Some(&json!("b")));
        assert_eq!(base.lookup("var.port"), Some(&json!(80)));
        assert_eq!(base.lookup("response.code"), Some(&json!(200)));
    }

    #[test]
    fn test_with_namespace() {
        let mut values = Map::new();
        values.insert("token".to_string(), json!("abc"));

        let vars = Variables::with_namespace("var", values);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.lookup("var.token"), Some(&json!("abc")));
    }

    #[test]
    fn test_flatten_store_uses_root_keys_without_prefix() {
        let vars = store(json!({ "token": "abc", "user": { "id": 1 } }));
        let pairs = vars.flatten();

        assert!(pairs.contains(&EnvPair::new("TOKEN", "abc")));
        assert!(pairs.contains(&EnvPair::new("USER", r#"{"id":1}"#)));
        assert!(pairs.contains(&EnvPair::new("USER_ID", "1")));
    }
}
