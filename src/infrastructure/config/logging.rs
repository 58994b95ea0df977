//! Logging configuration and initialization.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// True when log lines should be emitted as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }

    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// Log lines go to stderr. `RUST_LOG` takes precedence over the configured
    /// level. Calling this more than once keeps the first subscriber.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        if self.is_json() {
            let _ = fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        } else {
            let _ = fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_section_keeps_defaults() {
        let config: LoggingConfig = toml::from_str("format = \"json\"").unwrap();

        assert_eq!(config.level, "info");
        assert!(config.is_json());
    }

    #[test]
    fn default_is_pretty_info() {
        let config = LoggingConfig::default();

        assert_eq!(config.level, "info");
        assert!(!config.is_json());
    }
}
