//! Exporter settings loading and validation.
//!
//! Settings are optional: every field has a default matching twemproxy's
//! stock stats port and the conventional exporter port, so the exporter runs
//! with no settings file at all. When present, the file is TOML:
//!
//! ```toml
//! [source]
//! address = "localhost:22222"
//! max_payload_bytes = 8192
//! timeout_ms = 2000
//!
//! [poll]
//! interval_ms = 3000
//!
//! [metrics]
//! listen_address = "0.0.0.0"
//! port = 9500
//! path = "/metrics"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::adapter::inbound::http::{DEFAULT_METRICS_PATH, DEFAULT_PORT};
use crate::adapter::outbound::tcp::{DEFAULT_ADDRESS, DEFAULT_MAX_PAYLOAD_BYTES};
use crate::error::{ConfigError, Result};

/// Label used when the host name cannot be determined.
pub const UNKNOWN_HOST: &str = "unknown_host";

/// Main exporter configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    /// Where to fetch stats from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Poll cadence.
    #[serde(default)]
    pub poll: PollConfig,

    /// Scrape endpoint.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Twemproxy stats endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// `host:port` of the stats listener.
    #[serde(default = "default_source_address")]
    pub address: String,
    /// Read bound per payload; larger payloads are truncated.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// Connect and read timeout. Unset waits indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SourceConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            address: default_source_address(),
            max_payload_bytes: default_max_payload_bytes(),
            timeout_ms: None,
        }
    }
}

fn default_source_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

const fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

/// Poll lane settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollConfig {
    /// Time between tick starts in milliseconds (default: 3000).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl PollConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

const fn default_interval_ms() -> u64 {
    3000
}

/// Scrape endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
    /// Value of the `instance` label. Defaults to the host name.
    #[serde(default)]
    pub instance: Option<String>,
}

impl MetricsConfig {
    #[must_use]
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }

    /// Resolve the `instance` label: configured value, then host name, then
    /// [`UNKNOWN_HOST`].
    #[must_use]
    pub fn instance_label(&self) -> String {
        self.instance
            .clone()
            .or_else(hostname)
            .unwrap_or_else(|| UNKNOWN_HOST.to_string())
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            port: default_port(),
            path: default_metrics_path(),
            instance: None,
        }
    }
}

const fn default_listen_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_string()
}

#[cfg(unix)]
fn hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: buf is valid for writes of buf.len() bytes.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..len]).into_owned();
    (!name.is_empty()).then_some(name)
}

#[cfg(not(unix))]
fn hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok().filter(|h| !h.is_empty())
}

impl Settings {
    /// Parse settings from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    ///
    /// Run again after command-line overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] or [`ConfigError::InvalidValue`]
    /// for the first offending field.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.source.address.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "source.address",
            }
            .into());
        }
        if self.source.max_payload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "source.max_payload_bytes",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.source.timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "source.timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.poll.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll.interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !self.metrics.path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "metrics.path",
                reason: "must start with '/'".to_string(),
            }
            .into());
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::parse_toml("").unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.source.address, "localhost:22222");
        assert_eq!(settings.source.max_payload_bytes, 8192);
        assert_eq!(settings.source.timeout(), None);
        assert_eq!(settings.poll.interval(), Duration::from_secs(3));
        assert_eq!(settings.metrics.bind_address().port(), 9500);
        assert_eq!(settings.metrics.path, "/metrics");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn full_document_overrides_defaults() {
        let settings = Settings::parse_toml(
            r#"
            [source]
            address = "10.1.0.5:22222"
            max_payload_bytes = 65536
            timeout_ms = 1500

            [poll]
            interval_ms = 500

            [metrics]
            listen_address = "127.0.0.1"
            port = 9600
            path = "/prom"
            instance = "proxy-a"

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(settings.source.address, "10.1.0.5:22222");
        assert_eq!(settings.source.max_payload_bytes, 65536);
        assert_eq!(settings.source.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(settings.poll.interval(), Duration::from_millis(500));
        assert_eq!(
            settings.metrics.bind_address(),
            "127.0.0.1:9600".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(settings.metrics.path, "/prom");
        assert_eq!(settings.metrics.instance_label(), "proxy-a");
        assert!(settings.logging.is_json());
    }

    #[test]
    fn instance_label_falls_back_to_host() {
        let metrics = MetricsConfig::default();
        assert!(!metrics.instance_label().is_empty());
    }

    #[test]
    fn rejects_zero_interval() {
        let result = Settings::parse_toml("[poll]\ninterval_ms = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "poll.interval_ms",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = Settings::parse_toml("[source]\ntimeout_ms = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "source.timeout_ms",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_relative_metrics_path() {
        let result = Settings::parse_toml("[metrics]\npath = \"metrics\"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "metrics.path",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_unknown_log_format() {
        let result = Settings::parse_toml("[logging]\nformat = \"xml\"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "logging.format",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_blank_source_address() {
        let result = Settings::parse_toml("[source]\naddress = \" \"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField {
                field: "source.address"
            }))
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        let result = Settings::parse_toml("[poll\ninterval_ms = 1");
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
    }
}
