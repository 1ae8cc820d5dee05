//! Runtime configuration for one simulation generation.
//!
//! Separate from the TOML schema in `lift_config`; see `conversions`.

use crate::car::Car;
use crate::error::{LiftError, Result};
use crate::types::Floor;
use std::time::Duration;

/// Accepted cycle interval range in seconds, inclusive.
pub const CYCLE_RANGE_S: std::ops::RangeInclusive<f64> = 1.0..=10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub lowest_floor: Floor,
    pub highest_floor: Floor,
    pub capacity: usize,
    pub start_floor: Floor,
    /// Seconds between cycles.
    pub cycle_s: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            lowest_floor: -1,
            highest_floor: 5,
            capacity: 8,
            start_floor: 0,
            cycle_s: 3.0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        Car::validate_construction(
            self.lowest_floor,
            self.highest_floor,
            self.capacity,
            self.start_floor,
        )?;
        if !CYCLE_RANGE_S.contains(&self.cycle_s) {
            return Err(LiftError::Config(format!(
                "cycle interval {}s must be within {}..={}s",
                self.cycle_s,
                CYCLE_RANGE_S.start(),
                CYCLE_RANGE_S.end()
            )));
        }
        Ok(())
    }

    /// Cycle interval as a `Duration`. Only meaningful after `validate`.
    pub fn cycle(&self) -> Duration {
        Duration::try_from_secs_f64(self.cycle_s).unwrap_or(Duration::from_secs(3))
    }
}
