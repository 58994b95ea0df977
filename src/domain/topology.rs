//! Declared proxy topology.
//!
//! The topology is the authoritative "expected" side of reconciliation: every
//! pool the proxy fronts, and every backend server each pool should be talking
//! to. It is loaded once at startup and shared read-only by every poll cycle.

use std::collections::BTreeMap;

use crate::error::ConfigError;

/// One backend server declared for a service.
///
/// Twemproxy server entries look like `host:port:weight [alias]`. The address
/// is kept verbatim since it is also how twemproxy keys unaliased servers in
/// its stats output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRef {
    address: String,
    alias: Option<String>,
}

impl BackendRef {
    /// Create a backend reference. An empty or blank alias is treated as no alias.
    #[must_use]
    pub fn new(address: impl Into<String>, alias: Option<String>) -> Self {
        let alias = alias
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        Self {
            address: address.into(),
            alias,
        }
    }

    /// Parse a server entry of the form `address[ alias]`.
    ///
    /// Returns `None` for a blank entry. Tokens after the alias are ignored.
    #[must_use]
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split_whitespace();
        let address = parts.next()?;
        let alias = parts.next().map(str::to_string);
        Some(Self::new(address, alias))
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Key used to find this backend in a service's stats block: the alias
    /// when one is declared, the raw address otherwise.
    #[must_use]
    pub fn host_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.address)
    }

    /// Name shown for this backend in exported metrics.
    #[must_use]
    pub fn display_alias(&self) -> &str {
        self.host_key()
    }
}

/// Scalar tuning fields of a twemproxy pool.
///
/// None of these influence reconciliation; they are carried so the loaded
/// topology reflects the whole pool declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub hash: String,
    pub hash_tag: String,
    pub distribution: String,
    pub auto_eject_hosts: bool,
    /// Server timeout in milliseconds; `None` waits indefinitely.
    pub timeout: Option<u64>,
    pub protocol: Option<String>,
    pub redis: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            hash: "fnv1a_64".into(),
            hash_tag: String::new(),
            distribution: "ketama".into(),
            auto_eject_hosts: false,
            timeout: None,
            protocol: None,
            redis: false,
        }
    }
}

/// A logical service (twemproxy pool) and its declared backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    name: String,
    settings: ServiceSettings,
    backends: Vec<BackendRef>,
}

impl Service {
    #[must_use]
    pub fn new(name: impl Into<String>, settings: ServiceSettings, backends: Vec<BackendRef>) -> Self {
        Self {
            name: name.into(),
            settings,
            backends,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    #[must_use]
    pub fn backends(&self) -> &[BackendRef] {
        &self.backends
    }
}

/// Immutable mapping from service name to its declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    services: BTreeMap<String, Service>,
}

impl Topology {
    /// Build a topology from service declarations.
    ///
    /// A later service with the same name replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoServers`] when no service declares a backend.
    pub fn new(services: impl IntoIterator<Item = Service>) -> Result<Self, ConfigError> {
        let services: BTreeMap<String, Service> = services
            .into_iter()
            .map(|service| (service.name.clone(), service))
            .collect();

        let topology = Self { services };
        if topology.backend_count() == 0 {
            return Err(ConfigError::NoServers);
        }
        Ok(topology)
    }

    /// Iterate services in name order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    #[must_use]
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Total number of declared backends across all services.
    #[must_use]
    pub fn backend_count(&self) -> usize {
        self.services.values().map(|s| s.backends.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_only() {
        let backend = BackendRef::parse("10.0.0.1:6379:1").unwrap();
        assert_eq!(backend.address(), "10.0.0.1:6379:1");
        assert_eq!(backend.alias(), None);
        assert_eq!(backend.host_key(), "10.0.0.1:6379:1");
        assert_eq!(backend.display_alias(), "10.0.0.1:6379:1");
    }

    #[test]
    fn parse_address_with_alias() {
        let backend = BackendRef::parse("10.0.0.2:6379:1 cache2").unwrap();
        assert_eq!(backend.address(), "10.0.0.2:6379:1");
        assert_eq!(backend.alias(), Some("cache2"));
        assert_eq!(backend.host_key(), "cache2");
        assert_eq!(backend.display_alias(), "cache2");
    }

    #[test]
    fn parse_ignores_extra_whitespace() {
        let backend = BackendRef::parse("  10.0.0.3:6379:1   cache3  ").unwrap();
        assert_eq!(backend.address(), "10.0.0.3:6379:1");
        assert_eq!(backend.alias(), Some("cache3"));
    }

    #[test]
    fn parse_blank_entry_is_none() {
        assert!(BackendRef::parse("").is_none());
        assert!(BackendRef::parse("   ").is_none());
    }

    #[test]
    fn empty_alias_falls_back_to_address() {
        let backend = BackendRef::new("10.0.0.1:11211:1", Some(String::new()));
        assert_eq!(backend.alias(), None);
        assert_eq!(backend.host_key(), "10.0.0.1:11211:1");
        assert_eq!(backend.display_alias(), "10.0.0.1:11211:1");
    }

    #[test]
    fn topology_counts_backends_across_services() {
        let topology = Topology::new(vec![
            Service::new(
                "alpha",
                ServiceSettings::default(),
                vec![BackendRef::new("a:1", None), BackendRef::new("b:1", None)],
            ),
            Service::new("beta", ServiceSettings::default(), vec![BackendRef::new("c:1", None)]),
        ])
        .unwrap();

        assert_eq!(topology.len(), 2);
        assert_eq!(topology.backend_count(), 3);
        assert!(topology.service("alpha").is_some());
        assert!(topology.service("gamma").is_none());
    }

    #[test]
    fn topology_allows_empty_service_when_others_have_backends() {
        let topology = Topology::new(vec![
            Service::new("empty", ServiceSettings::default(), vec![]),
            Service::new("full", ServiceSettings::default(), vec![BackendRef::new("a:1", None)]),
        ])
        .unwrap();

        assert_eq!(topology.backend_count(), 1);
    }

    #[test]
    fn topology_without_backends_is_rejected() {
        let result = Topology::new(vec![Service::new("empty", ServiceSettings::default(), vec![])]);
        assert!(matches!(result, Err(ConfigError::NoServers)));

        let result = Topology::new(Vec::new());
        assert!(matches!(result, Err(ConfigError::NoServers)));
    }
}
