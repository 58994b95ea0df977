//! Topology and payload fixtures.
//!
//! The sample topology declares two pools:
//!
//! - `alpha`: `10.0.0.1:6379:1` (unaliased) and `10.0.0.2:6379:1 cache2`
//! - `beta`: three unaliased memcached backends
//!
//! [`alpha_payload`] reports only `alpha`, and only its `cache2` backend,
//! which gives `expected_available == 5` and `not_available == 1`.

use serde_json::{json, Map, Value};

use crate::domain::{BackendRef, Service, ServiceSettings, Topology};

/// TOML rendering of [`sample_topology`].
pub const SAMPLE_TOPOLOGY_TOML: &str = r#"
[alpha]
hash = "fnv1a_64"
distribution = "ketama"
auto_eject_hosts = true
redis = true
servers = ["10.0.0.1:6379:1", "10.0.0.2:6379:1 cache2"]

[beta]
hash = "fnv1a_64"
distribution = "ketama"
servers = ["10.0.1.1:11211:1", "10.0.1.2:11211:1", "10.0.1.3:11211:1"]
"#;

/// `nutcracker.yml` rendering of [`sample_topology`].
pub const SAMPLE_TOPOLOGY_YAML: &str = r#"
alpha:
  listen: 127.0.0.1:22121
  hash: fnv1a_64
  distribution: ketama
  auto_eject_hosts: true
  redis: true
  servers:
   - 10.0.0.1:6379:1
   - 10.0.0.2:6379:1 cache2

beta:
  listen: 127.0.0.1:22122
  hash: fnv1a_64
  distribution: ketama
  servers:
   - 10.0.1.1:11211:1
   - 10.0.1.2:11211:1
   - 10.0.1.3:11211:1
"#;

/// Build a service from twemproxy-style server entries.
pub fn service(name: &str, entries: &[&str]) -> Service {
    let backends = entries
        .iter()
        .filter_map(|entry| BackendRef::parse(entry))
        .collect();
    Service::new(name, ServiceSettings::default(), backends)
}

/// The two-pool topology described in the module docs.
pub fn sample_topology() -> Topology {
    Topology::new(vec![
        service("alpha", &["10.0.0.1:6379:1", "10.0.0.2:6379:1 cache2"]),
        service(
            "beta",
            &["10.0.1.1:11211:1", "10.0.1.2:11211:1", "10.0.1.3:11211:1"],
        ),
    ])
    .expect("sample topology declares backends")
}

/// Per-server block with `server_connections` set and small non-zero counters.
pub fn server_block(connections: u64) -> Value {
    json!({
        "server_eof": 0,
        "server_err": 0,
        "server_timedout": 0,
        "server_connections": connections,
        "server_ejected_at": 0,
        "requests": 10,
        "request_bytes": 512,
        "responses": 10,
        "response_bytes": 1024,
        "in_queue": 0,
        "in_queue_bytes": 0,
        "out_queue": 0,
        "out_queue_bytes": 0,
    })
}

/// Pool block holding the mandatory pool counters plus `servers`.
pub fn pool_block(servers: Vec<(&str, Value)>) -> Value {
    let mut pool = Map::new();
    for counter in [
        "client_eof",
        "client_err",
        "client_connections",
        "server_ejects",
        "forward_error",
        "fragments",
    ] {
        pool.insert(counter.to_string(), json!(0));
    }
    for (key, block) in servers {
        pool.insert(key.to_string(), block);
    }
    Value::Object(pool)
}

/// Full stats document with proxy counters and the given pools.
pub fn payload(pools: Vec<(&str, Value)>) -> Vec<u8> {
    let mut root = Map::new();
    root.insert("service".into(), json!("nutcracker"));
    root.insert("source".into(), json!("cache-01"));
    root.insert("version".into(), json!("0.5.0"));
    root.insert("uptime".into(), json!(3600));
    root.insert("timestamp".into(), json!(1_700_000_000));
    root.insert("total_connections".into(), json!(120));
    root.insert("curr_connections".into(), json!(8));
    for (name, block) in pools {
        root.insert(name.to_string(), block);
    }
    serde_json::to_vec(&Value::Object(root)).expect("json value serializes")
}

/// `alpha` reporting only `cache2` with five connections; `beta` absent.
pub fn alpha_payload() -> Vec<u8> {
    payload(vec![("alpha", pool_block(vec![("cache2", server_block(5))]))])
}

/// Every backend of [`sample_topology`] reporting one connection.
pub fn full_payload() -> Vec<u8> {
    payload(vec![
        (
            "alpha",
            pool_block(vec![
                ("10.0.0.1:6379:1", server_block(1)),
                ("cache2", server_block(1)),
            ]),
        ),
        (
            "beta",
            pool_block(vec![
                ("10.0.1.1:11211:1", server_block(1)),
                ("10.0.1.2:11211:1", server_block(1)),
                ("10.0.1.3:11211:1", server_block(1)),
            ]),
        ),
    ])
}
