//! Stats source port.

use async_trait::async_trait;

use crate::error::TransportError;

/// Something that can hand over one complete raw stats payload per call.
///
/// Implementations hold no connection between calls: every fetch opens a
/// fresh one and releases it before returning.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch one payload.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the connection cannot be opened or read.
    async fn fetch(&self) -> Result<Vec<u8>, TransportError>;

    /// Human-readable endpoint description for logs.
    fn endpoint(&self) -> &str;
}
