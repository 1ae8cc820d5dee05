//! Cycle pacing helpers.

use lift_traits::Clock;
use std::time::{Duration, Instant};

/// Default floor on the pause between two ticks.
pub const DEFAULT_MIN_TICK: Duration = Duration::from_millis(50);

/// Default bound on how long reconfiguration waits for the previous task.
pub const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause before the next tick: whatever is left of `cycle` after `elapsed`,
/// never less than `min_tick`.
pub fn next_sleep(cycle: Duration, elapsed: Duration, min_tick: Duration) -> Duration {
    cycle.saturating_sub(elapsed).max(min_tick)
}

/// `next_sleep` measured against `clock` for a tick that began at `started`.
pub fn pace<C: Clock + ?Sized>(
    clock: &C,
    started: Instant,
    cycle: Duration,
    min_tick: Duration,
) -> Duration {
    next_sleep(cycle, clock.elapsed_since(started), min_tick)
}
