#![forbid(unsafe_code)]

//! Initialization parameter bag handed from the host to an embedded document.

use serde::{Deserialize, Serialize};
use serde_json::Map;

pub use serde_json::Value;

use crate::error::{ModalError, Result};

/// String-keyed mapping of arbitrary JSON values.
///
/// Lookups of absent keys return `None`; nothing here ever fails on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one for that key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a string value. Non-string values yield `None`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Accept a JSON object (or `null`, meaning no parameters).
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(ModalError::invalid_argument(format!(
                "parameters must be an object, got {other}"
            ))),
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_key_is_none() {
        let params = Params::new().with("title", "Hello");
        assert_eq!(params.get_str("title"), Some("Hello"));
        assert!(params.get("missing").is_none());
        assert!(params.get_str("missing").is_none());
    }

    #[test]
    fn from_value_accepts_object_and_null() {
        let params = Params::from_value(json!({"one": 1, "two": [2]})).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("one"), Some(&json!(1)));
        assert!(Params::from_value(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn from_value_rejects_scalars() {
        let err = Params::from_value(json!("nope")).unwrap_err();
        assert!(matches!(err, ModalError::InvalidArgument(_)));
    }

    #[test]
    fn collects_from_pairs() {
        let params: Params = [("a", json!(true)), ("b", json!("x"))].into_iter().collect();
        assert!(params.contains("a"));
        assert_eq!(params.get_str("b"), Some("x"));
    }
}
