//! Metadata — namespaced annotations attached to items.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;
use crate::id::ItemName;

/// Identifies one metadata record: a namespace applied to one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataKey {
    pub namespace: String,
    pub item_name: ItemName,
}

impl MetadataKey {
    #[must_use]
    pub fn new(namespace: impl Into<String>, item_name: impl Into<ItemName>) -> Self {
        Self {
            namespace: namespace.into(),
            item_name: item_name.into(),
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.item_name)
    }
}

/// One metadata record: a main value plus structured configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub key: MetadataKey,
    pub value: String,
    #[serde(default)]
    pub configuration: Configuration,
}

impl Metadata {
    #[must_use]
    pub fn new(key: MetadataKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
            configuration: Configuration::default(),
        }
    }

    #[must_use]
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }
}
