//! Reconciliation of raw twemproxy stats against the declared topology.
//!
//! Twemproxy's stats port returns one JSON object per connection. Proxy-wide
//! counters sit at the root next to one object per pool; each pool object
//! carries pool counters next to one object per backend server, keyed by the
//! server's alias (or its address when unaliased):
//!
//! ```text
//! {
//!   "service": "nutcracker", "source": "cache-01",
//!   "total_connections": 120, "curr_connections": 8,
//!   "alpha": {
//!     "client_eof": 0, "client_err": 0, "client_connections": 4,
//!     "server_ejects": 0, "forward_error": 0, "fragments": 0,
//!     "cache2": { "server_connections": 1, "requests": 10, ... }
//!   }
//! }
//! ```
//!
//! Only services and servers declared in the [`Topology`] are looked at. The
//! topology decides what is *expected*; the payload decides what is missing.

use serde_json::{Map, Value};

use crate::error::TranslateError;

use super::stats::{ServerStats, ServiceStats, StatsSnapshot};
use super::topology::{BackendRef, Service, Topology};

/// Scope name used in errors for fields at the payload root.
const ROOT_SCOPE: &str = "stats";

/// Translate one raw stats payload into a typed snapshot.
///
/// Translation is pure and atomic: either the whole snapshot is built or an
/// error is returned.
///
/// Availability accounting:
///
/// - every declared backend counts toward `expected_available`, whether or
///   not its service reports;
/// - a declared backend missing from a reporting service, or reporting fewer
///   than one server connection, counts toward `not_available` for its
///   service and for the snapshot;
/// - a service with no block in the payload contributes nothing to
///   `not_available` and produces no [`ServiceStats`].
///
/// # Errors
///
/// - [`TranslateError::MalformedPayload`] if `raw` is not valid JSON
/// - [`TranslateError::UnexpectedRoot`] if the JSON root is not an object
/// - [`TranslateError::MissingField`] if a mandatory proxy or pool field is
///   absent or has the wrong type
pub fn translate(raw: &[u8], topology: &Topology) -> Result<StatsSnapshot, TranslateError> {
    let document: Value = serde_json::from_slice(raw).map_err(TranslateError::MalformedPayload)?;
    let root = match &document {
        Value::Object(map) => Fields::new(ROOT_SCOPE, map),
        other => {
            return Err(TranslateError::UnexpectedRoot {
                found: kind_of(other),
            })
        }
    };

    let mut snapshot = StatsSnapshot {
        service: root.string("service")?,
        source: root.string("source")?,
        total_connections: root.number("total_connections")?,
        current_connections: root.number("curr_connections")?,
        ..StatsSnapshot::default()
    };

    for service in topology.services() {
        snapshot.expected_available += service.backends().len();

        let Some(block) = root.object(service.name())? else {
            continue;
        };

        let stats = translate_service(service, &block)?;
        snapshot.not_available += stats.not_available;
        snapshot.services.insert(service.name().to_string(), stats);
    }

    Ok(snapshot)
}

fn translate_service(service: &Service, block: &Fields<'_>) -> Result<ServiceStats, TranslateError> {
    let mut stats = ServiceStats {
        name: service.name().to_string(),
        client_eof: block.number("client_eof")?,
        client_err: block.number("client_err")?,
        client_connections: block.number("client_connections")?,
        server_ejects: block.number("server_ejects")?,
        forward_error: block.number("forward_error")?,
        fragments: block.number("fragments")?,
        expected_available: service.backends().len(),
        ..ServiceStats::default()
    };

    for backend in service.backends() {
        let Some(value) = block.get(backend.host_key()) else {
            stats.not_available += 1;
            continue;
        };

        let server = translate_server(backend, value);
        if !server.is_connected() {
            stats.not_available += 1;
        }
        stats.servers.insert(backend.host_key().to_string(), server);
    }

    Ok(stats)
}

fn translate_server(backend: &BackendRef, value: &Value) -> ServerStats {
    let leaves = Fields::lenient(backend.host_key(), value);

    ServerStats {
        host: backend.host_key().to_string(),
        host_alias: backend.display_alias().to_string(),
        server_eof: leaves.number_or_zero("server_eof"),
        server_err: leaves.number_or_zero("server_err"),
        server_timedout: leaves.number_or_zero("server_timedout"),
        server_connections: leaves.number_or_zero("server_connections"),
        server_ejected_at: leaves.number_or_zero("server_ejected_at"),
        requests: leaves.number_or_zero("requests"),
        request_bytes: leaves.number_or_zero("request_bytes"),
        responses: leaves.number_or_zero("responses"),
        response_bytes: leaves.number_or_zero("response_bytes"),
        in_queue: leaves.number_or_zero("in_queue"),
        in_queue_bytes: leaves.number_or_zero("in_queue_bytes"),
        out_queue: leaves.number_or_zero("out_queue"),
        out_queue_bytes: leaves.number_or_zero("out_queue_bytes"),
    }
}

/// Schema-driven view over one JSON object.
///
/// Every field read during translation goes through here, so a missing or
/// mistyped mandatory field always surfaces as a [`TranslateError::MissingField`]
/// naming its scope and expected shape.
struct Fields<'a> {
    scope: &'a str,
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    fn new(scope: &'a str, map: &'a Map<String, Value>) -> Self {
        Self {
            scope,
            map: Some(map),
        }
    }

    /// View that treats a non-object value as an object with no fields.
    fn lenient(scope: &'a str, value: &'a Value) -> Self {
        Self {
            scope,
            map: value.as_object(),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.and_then(|map| map.get(field))
    }

    fn missing(&self, field: &str, expected: &'static str) -> TranslateError {
        TranslateError::MissingField {
            scope: self.scope.to_string(),
            field: field.to_string(),
            expected,
        }
    }

    fn string(&self, field: &str) -> Result<String, TranslateError> {
        self.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| self.missing(field, "string"))
    }

    fn number(&self, field: &str) -> Result<f64, TranslateError> {
        self.get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| self.missing(field, "number"))
    }

    fn number_or_zero(&self, field: &str) -> f64 {
        self.get(field).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Nested object under `field`. `Ok(None)` if absent, an error if present
    /// with any other shape.
    fn object(&self, field: &str) -> Result<Option<Fields<'a>>, TranslateError> {
        match self.map.and_then(|map| map.get_key_value(field)) {
            None => Ok(None),
            Some((key, Value::Object(map))) => Ok(Some(Fields::new(key, map))),
            Some(_) => Err(self.missing(field, "object")),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
