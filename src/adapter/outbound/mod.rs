//! Outbound adapters implementing the driven ports.

pub mod metrics;
pub mod tcp;

pub use metrics::PrometheusSink;
pub use tcp::TcpStatsSource;
