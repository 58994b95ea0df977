//! Composition root: wires the stats source, poller, metrics sink and HTTP
//! server from resolved settings.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::http::MetricsServer;
use crate::adapter::outbound::{PrometheusSink, TcpStatsSource};
use crate::domain::{translate, StatsSnapshot, Topology};
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::Settings;
use crate::port::StatsSource;
use crate::runtime::Poller;

/// Build the TCP source described by `[source]`.
#[must_use]
pub fn build_source(settings: &Settings) -> TcpStatsSource {
    TcpStatsSource::new(settings.source.address.clone())
        .with_max_payload_bytes(settings.source.max_payload_bytes)
        .with_timeout(settings.source.timeout())
}

/// Build the Prometheus sink labelled with the resolved instance name.
///
/// # Errors
///
/// Returns [`crate::error::SinkError::Registration`] if the gauges cannot be registered.
#[allow(clippy::result_large_err)]
pub fn build_sink(settings: &Settings) -> Result<Arc<PrometheusSink>> {
    let instance = settings.metrics.instance_label();
    let sink = PrometheusSink::new(instance.clone())?;
    info!(instance = %instance, "Metrics sink ready");
    Ok(Arc::new(sink))
}

/// Fetch and translate a single snapshot without serving anything.
///
/// # Errors
///
/// Returns the transport or translation error of the attempt.
pub async fn poll_once(settings: &Settings, topology: &Topology) -> Result<StatsSnapshot> {
    let source = build_source(settings);

    let raw = source.fetch().await.map_err(|e| {
        warn!(endpoint = %source.endpoint(), error = %e, "Single poll failed to fetch");
        e
    })?;

    translate(&raw, topology).map_err(|e| {
        warn!(error = %e, "Single poll failed to translate");
        Error::from(e)
    })
}

/// Run the poll lane and the HTTP lane until a shutdown signal arrives or the
/// HTTP lane fails.
///
/// # Errors
///
/// Returns an error if the sink cannot be built or the HTTP server fails,
/// e.g. because its port is taken.
pub async fn serve(settings: Settings, topology: Arc<Topology>) -> Result<()> {
    let sink = build_sink(&settings)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = Poller::new(
        Arc::new(build_source(&settings)),
        topology,
        sink.clone(),
        settings.poll.interval(),
    );
    let poll_lane = tokio::spawn(async move { poller.run(shutdown_rx).await });

    let server = MetricsServer::new(settings.metrics.bind_address(), &settings.metrics.path, sink);
    let mut http_shutdown = shutdown_tx.subscribe();
    let mut http_lane = tokio::spawn(server.run(async move {
        let _ = http_shutdown.wait_for(|stop| *stop).await;
    }));

    let early_exit = tokio::select! {
        () = shutdown_signal() => None,
        joined = &mut http_lane => Some(joined),
    };

    let _ = shutdown_tx.send(true);

    let http_result = match early_exit {
        Some(joined) => joined,
        None => http_lane.await,
    };
    if let Err(e) = poll_lane.await {
        warn!(error = %e, "Poll lane terminated abnormally");
    }

    http_result.map_err(|e| Error::Io(std::io::Error::other(e)))?
}

/// Complete on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutdown signal received");
}
