//! `From` implementations bridging `lift_config` types to `lift_core` types.

use crate::boarding::{BoardingPolicy, MaximizeBoarding, PartialLimit};
use crate::config::SimConfig;
use std::sync::Arc;
use std::time::Duration;

// ── SimConfig ────────────────────────────────────────────────────────────────

impl From<&lift_config::Config> for SimConfig {
    fn from(c: &lift_config::Config) -> Self {
        Self {
            lowest_floor: c.building.lowest_floor,
            highest_floor: c.building.highest_floor,
            capacity: c.building.capacity as usize,
            start_floor: c.building.start_floor,
            cycle_s: c.timing.cycle_s,
        }
    }
}

// ── Boarding policy ──────────────────────────────────────────────────────────

pub fn policy_from(c: &lift_config::Boarding) -> Arc<dyn BoardingPolicy> {
    match c.partial_limit {
        Some(limit) => Arc::new(PartialLimit(limit)),
        None => Arc::new(MaximizeBoarding),
    }
}

// ── Harness timing ───────────────────────────────────────────────────────────

/// `(min_tick, cancel_timeout)` from the timing table.
pub fn harness_timing(c: &lift_config::Timing) -> (Duration, Duration) {
    (
        Duration::from_millis(c.min_tick_ms),
        Duration::from_millis(c.cancel_timeout_ms),
    )
}
