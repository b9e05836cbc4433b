//! Declared resources

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Set of resources to be managed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    /// Resources indexed by `type.name`
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, returning the one it replaced under the same key
    pub fn add(&mut self, resource: ResourceConfig) -> Option<ResourceConfig> {
        self.resources.insert(resource.key(), resource)
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&ResourceConfig> {
        self.resources.get(&resource_key(resource_type, name))
    }

    pub fn get_by_key(&self, key: &str) -> Option<&ResourceConfig> {
        self.resources.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Configuration for a declared resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "linode_domain")
    pub resource_type: String,

    /// Local name, unique per type
    pub name: String,

    /// Declared attribute values
    pub config: serde_json::Value,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            config,
        }
    }

    /// Get the full resource key (type.name)
    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.name)
    }
}

pub fn resource_key(resource_type: &str, name: &str) -> String {
    format!("{}.{}", resource_type, name)
}

/// Split a `type.name` key
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    key.split_once('.')
}
