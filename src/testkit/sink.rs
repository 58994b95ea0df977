//! [`MetricsSink`] that keeps every published snapshot.

use std::sync::Mutex;

use crate::domain::StatsSnapshot;
use crate::port::MetricsSink;

#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<StatsSnapshot>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots published so far.
    pub fn count(&self) -> usize {
        self.published.lock().expect("recording sink lock poisoned").len()
    }

    pub fn last(&self) -> Option<StatsSnapshot> {
        self.published
            .lock()
            .expect("recording sink lock poisoned")
            .last()
            .cloned()
    }

    pub fn snapshots(&self) -> Vec<StatsSnapshot> {
        self.published.lock().expect("recording sink lock poisoned").clone()
    }
}

impl MetricsSink for RecordingSink {
    fn publish(&self, snapshot: &StatsSnapshot) {
        self.published
            .lock()
            .expect("recording sink lock poisoned")
            .push(snapshot.clone());
    }
}
