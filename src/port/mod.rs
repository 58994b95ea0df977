//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!   ┌──────────────┐   raw bytes   ┌──────────────┐  snapshot  ┌──────────────┐
//!   │ StatsSource  ├──────────────►│   Poller +   ├───────────►│ MetricsSink  │
//!   │ (tcp adapter)│               │  translator  │            │ (prometheus) │
//!   └──────────────┘               └──────────────┘            └──────────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`StatsSource`] - Acquire one raw stats payload from the proxy
//! - [`MetricsSink`] - Publish a translated snapshot for scraping

pub mod outbound;

pub use outbound::sink::MetricsSink;
pub use outbound::source::StatsSource;
