//! Handler for the exporter command line.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use crate::adapter::inbound::cli::Cli;
use crate::domain::Topology;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Settings;
use crate::infrastructure::config::topology::load_topology;

/// Execute the command line: check, poll once, or serve until shutdown.
///
/// # Errors
///
/// Returns any startup error (settings, topology, sink registration, HTTP
/// bind) and, with `--once`, the error of the single poll.
pub async fn execute(cli: &Cli) -> Result<()> {
    let settings = cli.settings()?;
    settings.logging.init();

    let topology = Arc::new(load_topology(&cli.config)?);
    info!(
        path = %cli.config.display(),
        services = topology.len(),
        backends = topology.backend_count(),
        "Topology loaded"
    );

    if cli.check {
        print!("{}", check_report(&settings, &topology));
        return Ok(());
    }

    if cli.once {
        let snapshot = bootstrap::poll_once(&settings, &topology).await?;
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        println!("{json}");
        return Ok(());
    }

    info!(
        source = %settings.source.address,
        interval_ms = settings.poll.interval_ms,
        listen = %settings.metrics.bind_address(),
        path = %settings.metrics.path,
        "twemproxy-exporter starting"
    );
    bootstrap::serve(settings, topology).await?;
    info!("twemproxy-exporter stopped");
    Ok(())
}

/// Human-readable summary of the effective configuration.
#[must_use]
pub fn check_report(settings: &Settings, topology: &Topology) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Stats source:   {}", settings.source.address);
    let _ = writeln!(out, "Poll interval:  {}ms", settings.poll.interval_ms);
    let _ = writeln!(
        out,
        "Metrics:        http://{}{}",
        settings.metrics.bind_address(),
        settings.metrics.path
    );
    let _ = writeln!(out, "Instance label: {}", settings.metrics.instance_label());
    let _ = writeln!(
        out,
        "Topology:       {} services, {} backends",
        topology.len(),
        topology.backend_count()
    );
    for service in topology.services() {
        let _ = writeln!(out, "  {}", service.name());
        for backend in service.backends() {
            match backend.alias() {
                Some(alias) => {
                    let _ = writeln!(out, "    {alias} ({})", backend.address());
                }
                None => {
                    let _ = writeln!(out, "    {}", backend.address());
                }
            }
        }
    }
    out
}
