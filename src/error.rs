use thiserror::Error;

/// Configuration-related errors with structured variants.
///
/// Raised while loading the topology or the exporter settings. Always fatal:
/// the process exits before the poll lane starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to parse YAML topology: {0}")]
    ParseYaml(#[source] serde_yaml::Error),

    #[error("invalid server entry {entry:?} in service {service}")]
    InvalidServer { service: String, entry: String },

    #[error("no servers declared in topology")]
    NoServers,
}

/// Errors produced while translating one raw stats payload.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("malformed stats payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    #[error("malformed stats payload: root is {found}, expected an object")]
    UnexpectedRoot { found: &'static str },

    #[error("missing field {scope}.{field} (expected {expected})")]
    MissingField {
        scope: String,
        field: String,
        expected: &'static str,
    },
}

impl TranslateError {
    /// True when the payload itself could not be decoded as JSON.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            TranslateError::MalformedPayload(_) | TranslateError::UnexpectedRoot { .. }
        )
    }
}

/// Step of a fetch that a timeout interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStage {
    Connect,
    Read,
}

impl std::fmt::Display for TransportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Read => "read",
        })
    }
}

/// Connection or read failures against the twemproxy stats port.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read from {address}: {source}")]
    Read {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} against {address} timed out after {timeout_ms}ms")]
    Timeout {
        address: String,
        stage: TransportStage,
        timeout_ms: u64,
    },
}

/// Metrics sink errors.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to register metric {name}: {source}")]
    Registration {
        name: &'static str,
        #[source]
        source: prometheus::Error,
    },

    #[error("failed to encode metrics: {0}")]
    Encode(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
