//! Typed stats snapshot.
//!
//! A snapshot is produced fresh by every successful poll cycle, never mutated
//! after construction, and dropped once the metrics sink has consumed it.

use std::collections::BTreeMap;

use serde::Serialize;

/// Proxy-wide stats for one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Proxy service identifier reported by twemproxy (e.g. `nutcracker`).
    pub service: String,
    /// Host the proxy reports itself as running on.
    pub source: String,
    /// Cumulative client connections accepted by the proxy.
    pub total_connections: f64,
    /// Client connections currently open.
    pub current_connections: f64,
    /// Declared backend count summed over every service in the topology.
    pub expected_available: usize,
    /// Backends missing from the payload or reporting no server connection.
    pub not_available: usize,
    /// Per-service stats, keyed by service name. Services absent from the
    /// payload have no entry.
    pub services: BTreeMap<String, ServiceStats>,
}

/// Stats for one twemproxy pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceStats {
    pub name: String,
    pub client_eof: f64,
    pub client_err: f64,
    pub client_connections: f64,
    pub server_ejects: f64,
    pub forward_error: f64,
    pub fragments: f64,
    /// Number of backends declared for this service.
    pub expected_available: usize,
    pub not_available: usize,
    /// Per-server stats keyed by resolved host key.
    pub servers: BTreeMap<String, ServerStats>,
}

/// Stats for one backend server as reported inside a pool block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerStats {
    /// Resolved host key (alias if declared, else address).
    pub host: String,
    pub host_alias: String,
    pub server_eof: f64,
    pub server_err: f64,
    pub server_timedout: f64,
    pub server_connections: f64,
    pub server_ejected_at: f64,
    pub requests: f64,
    pub request_bytes: f64,
    pub responses: f64,
    pub response_bytes: f64,
    pub in_queue: f64,
    pub in_queue_bytes: f64,
    pub out_queue: f64,
    pub out_queue_bytes: f64,
}

impl ServerStats {
    /// A backend without at least one live server connection is unavailable.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.server_connections >= 1.0
    }
}
