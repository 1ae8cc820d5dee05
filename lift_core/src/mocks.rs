//! Test and helper observers for lift_core

use crate::snapshot::Snapshot;
use lift_traits::{BoxError, SnapshotSink};
use std::sync::{Arc, Mutex};

/// Keeps every delivered snapshot. Clones share the same buffer, so keep one
/// clone to inspect after handing the other to `Simulation::subscribe`.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    seen: Arc<Mutex<Vec<Snapshot>>>,
}

impl RecordingSink {
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl SnapshotSink<Snapshot> for RecordingSink {
    fn deliver(&mut self, item: &Snapshot) -> Result<(), BoxError> {
        self.seen
            .lock()
            .map_err(|_| "recording sink poisoned")?
            .push(item.clone());
        Ok(())
    }
}

/// An observer whose delivery always fails; useful for checking that one bad
/// observer does not starve the rest.
pub struct FailingSink;

impl SnapshotSink<Snapshot> for FailingSink {
    fn deliver(&mut self, _item: &Snapshot) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other("failing sink")))
    }
}
