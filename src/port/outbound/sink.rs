//! Metrics sink port.

use crate::domain::StatsSnapshot;

/// Destination for translated snapshots.
///
/// Publishing is infallible at this layer. Implementations must be safe to
/// read from concurrently (scrapes) while a publish is in progress.
pub trait MetricsSink: Send + Sync {
    /// Overwrite exported values with those in `snapshot`.
    fn publish(&self, snapshot: &StatsSnapshot);
}
