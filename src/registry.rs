//! Connection registry
//!
//! Name-keyed service destinations plus the name of the active one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One persisted connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Canonical URI of the service
    pub uri: String,

    /// SSH identity file, only kept when given explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl Destination {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            identity: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Name of the connection used when none is given (empty = none)
    #[serde(default)]
    pub active_service: String,

    #[serde(default)]
    pub service_destinations: BTreeMap<String, Destination>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.service_destinations.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Destination> {
        self.service_destinations.get(name)
    }

    /// The active connection, if one is set and still present
    pub fn active(&self) -> Option<(&str, &Destination)> {
        self.service_destinations
            .get_key_value(self.active_service.as_str())
            .map(|(name, dest)| (name.as_str(), dest))
    }

    /// Insert or replace `name`.
    ///
    /// The first connection added always becomes active. After that the
    /// active pointer only moves when `make_default` is set. An existing
    /// entry with the same name is overwritten.
    pub fn upsert(&mut self, name: &str, destination: Destination, make_default: bool) {
        if self.service_destinations.is_empty() {
            self.service_destinations = BTreeMap::from([(name.to_string(), destination)]);
            self.active_service = name.to_string();
            info!(connection = %name, "First connection, marked active");
            return;
        }

        if let Some(previous) = self
            .service_destinations
            .insert(name.to_string(), destination)
        {
            debug!(connection = %name, uri = %previous.uri, "Replaced existing connection");
        }

        if make_default {
            self.active_service = name.to_string();
            info!(connection = %name, "Marked active");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_insert_becomes_active() {
        let mut registry = Registry::new();
        registry.upsert("laptop", Destination::new("ssh://me@laptop:22"), false);

        assert_eq!(registry.active_service, "laptop");
        assert_eq!(registry.service_destinations.len(), 1);
        assert_eq!(registry.active().unwrap().0, "laptop");
    }

    #[test]
    fn test_first_insert_ignores_stale_active_pointer() {
        let mut registry = Registry {
            active_service: "gone".to_string(),
            ..Default::default()
        };
        registry.upsert("debug", Destination::new("tcp://localhost:8080"), false);
        assert_eq!(registry.active_service, "debug");
    }

    #[test]
    fn test_second_insert_keeps_active_without_default() {
        let mut registry = Registry::new();
        registry.upsert("a", Destination::new("tcp://a:1"), false);
        registry.upsert("b", Destination::new("tcp://b:1"), false);

        assert_eq!(registry.active_service, "a");
        assert_eq!(registry.service_destinations.len(), 2);
    }

    #[test]
    fn test_second_insert_with_default_moves_active() {
        let mut registry = Registry::new();
        registry.upsert("a", Destination::new("tcp://a:1"), false);
        registry.upsert("b", Destination::new("tcp://b:1"), true);

        assert_eq!(registry.active_service, "b");
    }

    #[test]
    fn test_reinsert_overwrites_only_that_entry() {
        let mut registry = Registry::new();
        registry.upsert("a", Destination::new("tcp://a:1"), false);
        registry.upsert("b", Destination::new("tcp://b:1"), false);

        let replacement = Destination {
            uri: "ssh://root@a:22/run/podman/podman.sock".to_string(),
            identity: Some("/keys/a".to_string()),
        };
        registry.upsert("a", replacement.clone(), false);

        assert_eq!(registry.get("a"), Some(&replacement));
        assert_eq!(registry.get("b"), Some(&Destination::new("tcp://b:1")));
        assert_eq!(registry.active_service, "a");
    }

    #[test]
    fn test_active_missing_entry() {
        let registry = Registry {
            active_service: "nope".to_string(),
            ..Default::default()
        };
        assert!(registry.active().is_none());
        assert!(registry.is_empty());
    }
}
