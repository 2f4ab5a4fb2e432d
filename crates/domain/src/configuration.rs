//! Configuration — free-form key/value settings carried by metadata records
//! and rule modules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Free-form configuration map.
///
/// Values are JSON scalars; the accessors apply the lenient coercions
/// hand-written configuration needs (numbers and booleans read as strings,
/// strings read as booleans).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(HashMap<String, serde_json::Value>);

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing any previous value.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`put`](Self::put).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.put(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String view of a scalar value; numbers and booleans are rendered.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            serde_json::Value::String(value) => Some(value.clone()),
            serde_json::Value::Number(value) => Some(value.to_string()),
            serde_json::Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Boolean view: booleans pass through, strings compare
    /// case-insensitively against `"true"`, other shapes read as `None`.
    #[must_use]
    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            serde_json::Value::Bool(value) => Some(*value),
            serde_json::Value::String(value) => Some(value.eq_ignore_ascii_case("true")),
            _ => None,
        }
    }

    /// Iterate over the configured keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_scalars_as_strings() {
        let config = Configuration::new()
            .with("duration", "5m")
            .with("threshold", 42)
            .with("enabled", true);
        assert_eq!(config.string("duration"), Some("5m".to_string()));
        assert_eq!(config.string("threshold"), Some("42".to_string()));
        assert_eq!(config.string("enabled"), Some("true".to_string()));
        assert_eq!(config.string("missing"), None);
    }

    #[test]
    fn should_coerce_booleans_from_strings() {
        let config = Configuration::new()
            .with("a", true)
            .with("b", "TRUE")
            .with("c", "yes")
            .with("d", 1);
        assert_eq!(config.boolean("a"), Some(true));
        assert_eq!(config.boolean("b"), Some(true));
        assert_eq!(config.boolean("c"), Some(false));
        assert_eq!(config.boolean("d"), None);
        assert_eq!(config.boolean("missing"), None);
    }

    #[test]
    fn should_collect_from_pairs() {
        let config: Configuration = [("thingUID", "demo:sensor:1"), ("status", "ONLINE")]
            .into_iter()
            .collect();
        assert!(config.contains_key("thingUID"));
        assert_eq!(config.keys().count(), 2);
    }

    #[test]
    fn should_serialize_transparently() {
        let config = Configuration::new().with("duration", "1h");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, serde_json::json!({"duration": "1h"}));
    }
}
