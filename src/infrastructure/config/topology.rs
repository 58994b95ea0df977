//! Topology file loading.
//!
//! The topology file is a twemproxy pool configuration. A `nutcracker.yml`
//! loads as is:
//!
//! ```yaml
//! alpha:
//!   listen: 127.0.0.1:22121
//!   hash: fnv1a_64
//!   distribution: ketama
//!   auto_eject_hosts: true
//!   timeout: 400
//!   redis: true
//!   servers:
//!    - 10.0.0.1:6379:1
//!    - 10.0.0.2:6379:1 cache2
//! ```
//!
//! The same pools may also be written as TOML, one table per pool. The format
//! follows the file extension: `.yml` and `.yaml` are YAML, anything else is
//! TOML.
//!
//! Unknown keys such as `listen` are ignored so a file shared with twemproxy
//! itself still loads.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{BackendRef, Service, ServiceSettings, Topology};
use crate::error::ConfigError;

/// One pool as written in the topology file.
#[derive(Debug, Deserialize)]
struct ServiceDeclaration {
    hash: Option<String>,
    hash_tag: Option<String>,
    distribution: Option<String>,
    auto_eject_hosts: Option<bool>,
    timeout: Option<u64>,
    protocol: Option<String>,
    redis: Option<bool>,
    #[serde(default)]
    servers: Vec<String>,
}

impl ServiceDeclaration {
    fn into_service(self, name: String) -> Result<Service, ConfigError> {
        let defaults = ServiceSettings::default();
        let settings = ServiceSettings {
            hash: self.hash.unwrap_or(defaults.hash),
            hash_tag: self.hash_tag.unwrap_or(defaults.hash_tag),
            distribution: self.distribution.unwrap_or(defaults.distribution),
            auto_eject_hosts: self.auto_eject_hosts.unwrap_or(defaults.auto_eject_hosts),
            timeout: self.timeout.or(defaults.timeout),
            protocol: self.protocol.or(defaults.protocol),
            redis: self.redis.unwrap_or(defaults.redis),
        };

        let backends = self
            .servers
            .iter()
            .map(|entry| {
                BackendRef::parse(entry).ok_or_else(|| ConfigError::InvalidServer {
                    service: name.clone(),
                    entry: entry.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Service::new(name, settings, backends))
    }
}

/// Document format of a topology file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyFormat {
    Yaml,
    Toml,
}

impl TopologyFormat {
    /// Pick the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                Self::Yaml
            }
            _ => Self::Toml,
        }
    }
}

/// Parse a topology document.
///
/// # Errors
///
/// Returns [`ConfigError::ParseYaml`] or [`ConfigError::Parse`] for a
/// malformed document, [`ConfigError::InvalidServer`] for a blank server
/// entry, and [`ConfigError::NoServers`] when no pool declares a backend.
pub fn parse_topology(content: &str, format: TopologyFormat) -> Result<Topology, ConfigError> {
    let declarations: BTreeMap<String, ServiceDeclaration> = match format {
        TopologyFormat::Yaml => serde_yaml::from_str(content).map_err(ConfigError::ParseYaml)?,
        TopologyFormat::Toml => toml::from_str(content).map_err(ConfigError::Parse)?,
    };

    let services = declarations
        .into_iter()
        .map(|(name, declaration)| declaration.into_service(name))
        .collect::<Result<Vec<_>, _>>()?;

    Topology::new(services)
}

/// Load a topology file, choosing the format by extension.
///
/// # Errors
///
/// Returns [`ConfigError::ReadFile`] if the file cannot be read, otherwise
/// whatever [`parse_topology`] returns.
pub fn load_topology<P: AsRef<Path>>(path: P) -> Result<Topology, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    parse_topology(&content, TopologyFormat::from_path(path))
}
