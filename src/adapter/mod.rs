//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`] - Driving side: command line and the metrics HTTP endpoint
//! - [`outbound`] - Driven side: the twemproxy TCP source and the Prometheus sink

pub mod inbound;
pub mod outbound;
