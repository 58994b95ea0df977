//! Twemproxy exporter - Prometheus metrics for twemproxy (nutcracker) pools.
//!
//! The exporter polls twemproxy's stats port on a fixed interval, reconciles
//! the reported stats against a declared pool topology, and republishes the
//! result as Prometheus gauges.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **`domain`** - Topology model, typed stats snapshot and the pure
//!   `translate` step that reconciles raw stats against the topology
//! - **`port`** - `StatsSource` and `MetricsSink` traits
//! - **`adapter`** - TCP stats source, Prometheus sink, HTTP scrape endpoint
//!   and command line
//! - **`runtime`** - The poll driver
//! - **`infrastructure`** - Configuration loading and process wiring
//!
//! # Example
//!
//! ```no_run
//! use twemproxy_exporter::domain::translate;
//! use twemproxy_exporter::infrastructure::config::topology::load_topology;
//!
//! let topology = load_topology("/etc/nutcracker.yml").unwrap();
//! let raw = std::fs::read("stats.json").unwrap();
//! let snapshot = translate(&raw, &topology).unwrap();
//! println!("{} of {} backends unavailable", snapshot.not_available, snapshot.expected_available);
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;
pub mod runtime;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
