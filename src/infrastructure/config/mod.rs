//! Infrastructure configuration modules.
//!
//! - [`settings`] - Exporter settings (source, poll cadence, metrics endpoint, logging)
//! - [`topology`] - Loader for the declared pool topology
//! - [`logging`] - Tracing subscriber initialization

pub mod logging;
pub mod settings;
pub mod topology;
