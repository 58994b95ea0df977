//! Fixed-interval poll driver.
//!
//! One tick walks `Idle -> Connecting -> Reading -> Translating -> Publishing`
//! and returns to `Idle`. Any failure aborts the tick from the state it
//! happened in; nothing is published and the next tick starts from scratch.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::{translate, StatsSnapshot, Topology};
use crate::error::{Error, TransportError, TransportStage};
use crate::port::{MetricsSink, StatsSource};

/// Where a tick is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Connecting,
    Reading,
    Translating,
    Publishing,
}

impl PollState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Reading => "reading",
            Self::Translating => "translating",
            Self::Publishing => "publishing",
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// The snapshot reached the sink.
    Published {
        expected_available: usize,
        not_available: usize,
    },
    /// The tick stopped in `state`; the sink was not touched.
    Aborted { state: PollState, error: Error },
}

impl TickOutcome {
    #[must_use]
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }

    /// State the tick aborted in, if it did.
    #[must_use]
    pub fn aborted_in(&self) -> Option<PollState> {
        match self {
            Self::Published { .. } => None,
            Self::Aborted { state, .. } => Some(*state),
        }
    }
}

/// Drives fetch, translate and publish on a fixed cadence.
pub struct Poller {
    source: Arc<dyn StatsSource>,
    topology: Arc<Topology>,
    sink: Arc<dyn MetricsSink>,
    interval: Duration,
}

impl Poller {
    #[must_use]
    pub fn new(
        source: Arc<dyn StatsSource>,
        topology: Arc<Topology>,
        sink: Arc<dyn MetricsSink>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            topology,
            sink,
            interval,
        }
    }

    /// Fetch and translate one snapshot without publishing it.
    ///
    /// # Errors
    ///
    /// Returns the transport or translation error together with the state it
    /// happened in.
    pub async fn snapshot(&self) -> Result<StatsSnapshot, (PollState, Error)> {
        let raw = self
            .source
            .fetch()
            .await
            .map_err(|e| (transport_state(&e), Error::from(e)))?;

        translate(&raw, &self.topology).map_err(|e| (PollState::Translating, Error::from(e)))
    }

    /// Run one complete cycle.
    pub async fn tick(&self) -> TickOutcome {
        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err((state, error)) => {
                warn!(
                    endpoint = self.source.endpoint(),
                    state = %state,
                    error = %error,
                    "Poll cycle aborted"
                );
                return TickOutcome::Aborted { state, error };
            }
        };

        self.sink.publish(&snapshot);
        debug!(
            services = snapshot.services.len(),
            expected_available = snapshot.expected_available,
            not_available = snapshot.not_available,
            "Published stats snapshot"
        );

        TickOutcome::Published {
            expected_available: snapshot.expected_available,
            not_available: snapshot.not_available,
        }
    }

    /// Tick until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first tick fires immediately. A tick in flight when shutdown is
    /// requested runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            endpoint = self.source.endpoint(),
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "Poll lane started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                info!("Shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            info!("Shutdown channel closed");
                            break;
                        }
                    }
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Poll lane stopped");
    }
}

fn transport_state(error: &TransportError) -> PollState {
    match error {
        TransportError::Connect { .. }
        | TransportError::Timeout {
            stage: TransportStage::Connect,
            ..
        } => PollState::Connecting,
        TransportError::Read { .. }
        | TransportError::Timeout {
            stage: TransportStage::Read,
            ..
        } => PollState::Reading,
    }
}
