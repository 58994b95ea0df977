//! Command-line interface definitions.
//!
//! Every flag except `--config` is an override: when given it replaces the
//! matching value from the settings file (or its default).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::Result;
use crate::infrastructure::config::settings::Settings;

/// Export twemproxy stats as Prometheus metrics
#[derive(Parser, Debug)]
#[command(name = "twemproxy-exporter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the topology file describing pools and their servers
    #[arg(short, long)]
    pub config: PathBuf,

    /// Optional exporter settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Twemproxy stats address (host:port)
    #[arg(long)]
    pub twemphost: Option<String>,

    /// Poll interval, e.g. 3s, 500ms, 1m30s or bare seconds
    #[arg(long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Port for the metrics endpoint
    #[arg(long)]
    pub port: Option<u16>,

    /// Path for the metrics endpoint
    #[arg(long)]
    pub metrics_path: Option<String>,

    /// Value of the `instance` label (defaults to the host name)
    #[arg(long)]
    pub instance: Option<String>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Validate the topology and settings, print a summary and exit
    #[arg(long, conflicts_with = "once")]
    pub check: bool,

    /// Poll once, print the snapshot as JSON and exit
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Resolve effective settings: file (or defaults), then flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be loaded or the merged
    /// settings fail validation.
    #[allow(clippy::result_large_err)]
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        self.apply_overrides(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply flag overrides onto `settings`.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(ref address) = self.twemphost {
            settings.source.address = address.clone();
        }
        if let Some(interval) = self.interval {
            settings.poll.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        }
        if let Some(port) = self.port {
            settings.metrics.port = port;
        }
        if let Some(ref path) = self.metrics_path {
            settings.metrics.path = path.clone();
        }
        if let Some(ref instance) = self.instance {
            settings.metrics.instance = Some(instance.clone());
        }
        if let Some(ref level) = self.log_level {
            settings.logging.level = level.clone();
        }
        if self.json_logs {
            settings.logging.format = "json".to_string();
        }
    }
}

/// Parse a human duration such as `3s`, `500ms`, `1m30s`, `1.5h` or `10`.
///
/// Units are `ms`, `s`, `m` and `h`; a bare number is seconds. The result
/// must be positive.
///
/// # Errors
///
/// Returns a message naming the offending input.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration is empty".to_string());
    }

    if let Ok(seconds) = input.parse::<f64>() {
        return positive(seconds * 1000.0, input);
    }

    let mut millis = 0.0;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{input}'"))?;
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid number in duration '{input}'"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        let scale = match unit {
            "ms" => 1.0,
            "s" => 1_000.0,
            "m" => 60_000.0,
            "h" => 3_600_000.0,
            other => return Err(format!("unknown unit '{other}' in duration '{input}'")),
        };

        millis += value * scale;
        rest = next;
    }

    positive(millis, input)
}

fn positive(millis: f64, input: &str) -> std::result::Result<Duration, String> {
    if !millis.is_finite() || millis <= 0.0 {
        return Err(format!("duration must be positive: '{input}'"));
    }
    Duration::try_from_secs_f64(millis / 1000.0)
        .map_err(|e| format!("duration out of range: '{input}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["twemproxy-exporter"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["twemproxy-exporter"]).is_err());
    }

    #[test]
    fn defaults_without_overrides() {
        let cli = parse(&["-c", "twemproxy.toml"]);
        let settings = cli.settings().unwrap();

        assert_eq!(cli.config, PathBuf::from("twemproxy.toml"));
        assert_eq!(settings, Settings::default());
        assert!(!cli.check);
        assert!(!cli.once);
    }

    #[test]
    fn flags_override_settings() {
        let cli = parse(&[
            "--config",
            "twemproxy.toml",
            "--twemphost",
            "10.0.0.9:22222",
            "--interval",
            "500ms",
            "--port",
            "9600",
            "--metrics-path",
            "/prom",
            "--instance",
            "proxy-a",
            "--log-level",
            "debug",
            "--json-logs",
        ]);
        let settings = cli.settings().unwrap();

        assert_eq!(settings.source.address, "10.0.0.9:22222");
        assert_eq!(settings.poll.interval_ms, 500);
        assert_eq!(settings.metrics.port, 9600);
        assert_eq!(settings.metrics.path, "/prom");
        assert_eq!(settings.metrics.instance.as_deref(), Some("proxy-a"));
        assert_eq!(settings.logging.level, "debug");
        assert!(settings.logging.is_json());
    }

    #[test]
    fn overrides_are_validated() {
        let cli = parse(&["-c", "t.toml", "--metrics-path", "metrics"]);
        assert!(matches!(
            cli.settings(),
            Err(Error::Config(ConfigError::InvalidValue {
                field: "metrics.path",
                ..
            }))
        ));
    }

    #[test]
    fn check_and_once_conflict() {
        let result = Cli::try_parse_from(["twemproxy-exporter", "-c", "t.toml", "--check", "--once"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_bad_interval_flag() {
        let result = Cli::try_parse_from(["twemproxy-exporter", "-c", "t.toml", "--interval", "3 days"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_duration("10"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
    }

    #[test]
    fn rejects_bad_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("3d").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("3s5").is_err());
        assert!(parse_duration("inf").is_err());
    }

    #[test]
    fn rejects_durations_too_large_to_represent() {
        let err = parse_duration("1e20").unwrap_err();
        assert!(err.contains("out of range"), "{err}");
        assert!(parse_duration("99999999999999999999h").is_err());
    }
}
