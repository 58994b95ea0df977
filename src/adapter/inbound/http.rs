//! HTTP server exposing the Prometheus scrape endpoint using Axum.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::adapter::outbound::PrometheusSink;
use crate::error::Result;

/// Default scrape path.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9500;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
struct ServerState {
    sink: Arc<PrometheusSink>,
    metrics_path: Arc<str>,
}

/// HTTP server that serves the most recently published gauge values.
///
/// Scrapes never trigger a poll; they read whatever the poll lane last
/// published, so a failed tick leaves the previous values in place.
pub struct MetricsServer {
    bind_address: SocketAddr,
    state: ServerState,
}

impl MetricsServer {
    #[must_use]
    pub fn new(bind_address: SocketAddr, metrics_path: &str, sink: Arc<PrometheusSink>) -> Self {
        Self {
            bind_address,
            state: ServerState {
                sink,
                metrics_path: Arc::from(metrics_path),
            },
        }
    }

    /// Build the router. Exposed separately so it can be exercised without a socket.
    pub fn router(&self) -> Router {
        let mut router = Router::new().route(&self.state.metrics_path, get(handle_metrics));
        if &*self.state.metrics_path != "/" {
            router = router.route("/", get(handle_root));
        }
        router.with_state(self.state.clone())
    }

    /// Serve until `shutdown_signal` completes.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the listener cannot be bound or the server fails.
    pub async fn run(self, shutdown_signal: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.bind_address).await?;

        info!(
            address = %self.bind_address,
            path = %self.state.metrics_path,
            "Metrics server listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal.await;
                info!("Metrics server received shutdown signal, stopping");
            })
            .await?;

        info!("Metrics server stopped");
        Ok(())
    }
}

async fn handle_metrics(State(state): State<ServerState>) -> Response {
    match state.sink.encode() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn handle_root(State(state): State<ServerState>) -> Html<String> {
    Html(format!(
        "<html><head><title>Twemproxy Exporter</title></head><body>\
         <h1>Twemproxy Exporter</h1>\
         <p><a href=\"{path}\">Metrics</a></p>\
         </body></html>",
        path = state.metrics_path
    ))
}
