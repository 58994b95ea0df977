//! Proxy-agnostic domain logic: the declared topology, the typed stats
//! snapshot, and the translation between raw payloads and snapshots.

mod stats;
mod topology;
mod translate;

pub use stats::{ServerStats, ServiceStats, StatsSnapshot};
pub use topology::{BackendRef, Service, ServiceSettings, Topology};
pub use translate::translate;
