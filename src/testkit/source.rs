//! Scripted [`StatsSource`] for driving the poller without a socket.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::port::StatsSource;

const ENDPOINT: &str = "scripted:22222";

/// A source that replays queued fetch results in order.
///
/// Builders append to one queue, so the call order of `with_*` methods is the
/// order results are returned in. Once the queue is empty every fetch fails
/// with a connection-refused error.
pub struct ScriptedSource {
    results: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_payloads(self, payloads: Vec<Vec<u8>>) -> Self {
        self.push_all(payloads.into_iter().map(Ok))
    }

    pub fn with_connect_failure(self) -> Self {
        self.push_all([Err(connect_error(io::ErrorKind::ConnectionRefused))])
    }

    pub fn with_read_failure(self) -> Self {
        self.push_all([Err(TransportError::Read {
            address: ENDPOINT.to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionReset),
        })])
    }

    fn push_all(
        self,
        results: impl IntoIterator<Item = Result<Vec<u8>, TransportError>>,
    ) -> Self {
        self.results
            .lock()
            .expect("scripted source lock poisoned")
            .extend(results);
        self
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsSource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<u8>, TransportError> {
        self.results
            .lock()
            .expect("scripted source lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(connect_error(io::ErrorKind::ConnectionRefused)))
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }
}

fn connect_error(kind: io::ErrorKind) -> TransportError {
    TransportError::Connect {
        address: ENDPOINT.to_string(),
        source: io::Error::from(kind),
    }
}
