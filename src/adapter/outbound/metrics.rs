//! Prometheus metrics sink.
//!
//! Owns its own [`Registry`] so several sinks (e.g. in tests) never collide.
//! Gauges are internally synchronized, so the poll lane can publish while the
//! HTTP lane gathers without any extra locking.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::domain::StatsSnapshot;
use crate::error::SinkError;
use crate::port::MetricsSink;

/// Metric namespace prefix.
pub const NAMESPACE: &str = "twemproxy";

const PROXY_LABELS: &[&str] = &["instance"];
const SERVER_LABELS: &[&str] = &["instance", "group", "redis_server"];

/// Gauges exported for one twemproxy instance.
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    instance: String,
    // Proxy metrics
    total_connections: GaugeVec,
    current_connections: GaugeVec,
    // Server metrics
    in_queue: GaugeVec,
    in_queue_bytes: GaugeVec,
    eof: GaugeVec,
    err: GaugeVec,
    timed_out: GaugeVec,
    connection: GaugeVec,
    ejected_at: GaugeVec,
}

impl PrometheusSink {
    /// Create a sink backed by a fresh registry.
    ///
    /// `instance` is the value of the `instance` label on every series.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Registration`] if a metric family cannot be registered.
    pub fn new(instance: impl Into<String>) -> Result<Self, SinkError> {
        Self::with_registry(Registry::new(), instance)
    }

    /// Create a sink that registers its metric families into `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Registration`] if a metric family cannot be
    /// registered, e.g. because the registry already holds one with the same name.
    pub fn with_registry(registry: Registry, instance: impl Into<String>) -> Result<Self, SinkError> {
        let proxy = |name, help| register(&registry, name, help, PROXY_LABELS);
        let total_connections = proxy("service_total_connections", "Total connections in twemproxy")?;
        let current_connections =
            proxy("service_current_connections", "Current connections in twemproxy")?;

        let server = |name, help| register(&registry, name, help, SERVER_LABELS);
        let in_queue = server("server_in_queue", "Requests queued towards the backend server")?;
        let in_queue_bytes = server("server_in_queue_bytes", "Bytes queued towards the backend server")?;
        let eof = server("server_eof", "EOF from backend server")?;
        let err = server("server_err", "Errors from backend server")?;
        let timed_out = server("server_timed_out", "Timed out requests to backend server")?;
        let connection = server("server_connection", "Open connections to backend server")?;
        let ejected_at = server("server_ejected_at", "Time the backend server was last ejected")?;

        Ok(Self {
            registry,
            instance: instance.into(),
            total_connections,
            current_connections,
            in_queue,
            in_queue_bytes,
            eof,
            err,
            timed_out,
            connection,
            ejected_at,
        })
    }

    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Render every registered family in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Encode`] if encoding fails.
    pub fn encode(&self) -> Result<String, SinkError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| SinkError::Encode(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| SinkError::Encode(e.to_string()))
    }
}

impl PrometheusSink {
    fn server_families(&self) -> [&GaugeVec; 7] {
        [
            &self.in_queue,
            &self.in_queue_bytes,
            &self.eof,
            &self.err,
            &self.timed_out,
            &self.connection,
            &self.ejected_at,
        ]
    }
}

impl MetricsSink for PrometheusSink {
    fn publish(&self, snapshot: &StatsSnapshot) {
        let instance = self.instance.as_str();

        self.total_connections
            .with_label_values(&[instance])
            .set(snapshot.total_connections);
        self.current_connections
            .with_label_values(&[instance])
            .set(snapshot.current_connections);

        // Series for backends absent from this snapshot must not linger.
        for family in self.server_families() {
            family.reset();
        }

        for (group, service) in &snapshot.services {
            for server in service.servers.values() {
                let labels = [instance, group.as_str(), server.host.as_str()];

                self.in_queue.with_label_values(&labels).set(server.in_queue);
                self.in_queue_bytes
                    .with_label_values(&labels)
                    .set(server.in_queue_bytes);
                self.eof.with_label_values(&labels).set(server.server_eof);
                self.err.with_label_values(&labels).set(server.server_err);
                self.timed_out
                    .with_label_values(&labels)
                    .set(server.server_timedout);
                self.connection
                    .with_label_values(&labels)
                    .set(server.server_connections);
                self.ejected_at
                    .with_label_values(&labels)
                    .set(server.server_ejected_at);
            }
        }
    }
}

fn register(
    registry: &Registry,
    name: &'static str,
    help: &'static str,
    labels: &[&str],
) -> Result<GaugeVec, SinkError> {
    let registration = |source| SinkError::Registration { name, source };

    let gauge = GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)
        .map_err(registration)?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(registration)?;
    Ok(gauge)
}
