//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`fixtures`] - Sample topology plus builders for raw stats payloads.
//! - [`source`] - `ScriptedSource`, a [`StatsSource`](crate::port::StatsSource)
//!   replaying queued payloads and transport failures.
//! - [`sink`] - `RecordingSink`, a [`MetricsSink`](crate::port::MetricsSink)
//!   that keeps every published snapshot.

pub mod fixtures;
pub mod sink;
pub mod source;
