//! Raw TCP stats source.
//!
//! Twemproxy's stats port is request-less: a peer connects and the proxy
//! immediately writes one JSON document, then closes the connection.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::{TransportError, TransportStage};
use crate::port::StatsSource;

/// Default twemproxy stats endpoint.
pub const DEFAULT_ADDRESS: &str = "localhost:22222";

/// Default read bound for one payload.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 8192;

/// Fetches stats by opening a fresh TCP connection per call.
#[derive(Debug, Clone)]
pub struct TcpStatsSource {
    address: String,
    max_payload_bytes: usize,
    timeout: Option<Duration>,
}

impl TcpStatsSource {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            timeout: None,
        }
    }

    /// Bound the number of bytes read per payload. Anything beyond is dropped.
    #[must_use]
    pub fn with_max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.max_payload_bytes = max_payload_bytes.max(1);
        self
    }

    /// Bound connect and read separately. `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn bounded<T>(
        &self,
        stage: TransportStage,
        fut: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, TransportError> {
        let Some(limit) = self.timeout else {
            return fut.await;
        };

        tokio::time::timeout(limit, fut)
            .await
            .unwrap_or_else(|_| {
                Err(TransportError::Timeout {
                    address: self.address.clone(),
                    stage,
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })
            })
    }

    async fn connect(&self) -> Result<TcpStream, TransportError> {
        TcpStream::connect(&self.address)
            .await
            .map_err(|source| TransportError::Connect {
                address: self.address.clone(),
                source,
            })
    }

    /// Read until the peer closes or the buffer is full.
    async fn read_payload(&self, mut stream: TcpStream) -> Result<Vec<u8>, TransportError> {
        let mut buffer = vec![0u8; self.max_payload_bytes];
        let mut filled = 0;

        while filled < buffer.len() {
            match stream.read(&mut buffer[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(TransportError::Read {
                        address: self.address.clone(),
                        source,
                    })
                }
            }
        }

        if filled == buffer.len() {
            warn!(
                address = %self.address,
                max_payload_bytes = self.max_payload_bytes,
                "Stats payload filled the read buffer and may be truncated"
            );
        }

        buffer.truncate(filled);
        Ok(buffer)
    }
}

#[async_trait]
impl StatsSource for TcpStatsSource {
    async fn fetch(&self) -> Result<Vec<u8>, TransportError> {
        let stream = self.bounded(TransportStage::Connect, self.connect()).await?;
        let payload = self.bounded(TransportStage::Read, self.read_payload(stream)).await?;
        debug!(address = %self.address, bytes = payload.len(), "Read stats payload");
        Ok(payload)
    }

    fn endpoint(&self) -> &str {
        &self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn serve_once(payload: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = socket.write_all(&payload).await;
            let _ = socket.shutdown().await;
        });

        addr.to_string()
    }

    #[tokio::test]
    async fn test_fetch_reads_whole_payload() {
        let payload = br#"{"service":"nutcracker"}"#.to_vec();
        let address = serve_once(payload.clone()).await;

        let source = TcpStatsSource::new(address);
        let read = source.fetch().await.unwrap();

        assert_eq!(read, payload);
    }

    #[tokio::test]
    async fn test_fetch_joins_chunked_writes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"{\"service\":").await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            socket.write_all(b"\"nutcracker\"}").await.unwrap();
        });

        let source = TcpStatsSource::new(addr.to_string());
        let read = source.fetch().await.unwrap();

        assert_eq!(read, b"{\"service\":\"nutcracker\"}".to_vec());
    }

    #[tokio::test]
    async fn test_fetch_truncates_oversized_payload() {
        let address = serve_once(vec![b'x'; 100]).await;

        let source = TcpStatsSource::new(address).with_max_payload_bytes(16);
        let read = source.fetch().await.unwrap();

        assert_eq!(read.len(), 16);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = TcpStatsSource::new(addr.to_string());
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_fetch_read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let source =
            TcpStatsSource::new(addr.to_string()).with_timeout(Some(Duration::from_millis(50)));
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::Timeout {
                stage: TransportStage::Read,
                timeout_ms: 50,
                ..
            }
        ));
    }

    #[test]
    fn test_endpoint_reports_address() {
        let source = TcpStatsSource::new(DEFAULT_ADDRESS);
        assert_eq!(source.endpoint(), "localhost:22222");
    }
}
