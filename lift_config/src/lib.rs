#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the lift simulation.
//!
//! Every table is optional; omitted keys fall back to the defaults of a
//! seven-floor building (`-1..=5`, eight passengers, three second cycle).
//! `Config::validate` enforces ranges before anything reaches the engine.
use serde::Deserialize;
use std::path::Path;

/// Smallest accepted cycle interval in seconds.
pub const MIN_CYCLE_S: f64 = 1.0;
/// Largest accepted cycle interval in seconds.
pub const MAX_CYCLE_S: f64 = 10.0;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Building {
    pub lowest_floor: i32,
    pub highest_floor: i32,
    pub capacity: u32,
    pub start_floor: i32,
}

impl Default for Building {
    fn default() -> Self {
        Self {
            lowest_floor: -1,
            highest_floor: 5,
            capacity: 8,
            start_floor: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Timing {
    /// Seconds between simulation cycles. Also accepts alias "cycle_time".
    #[serde(alias = "cycle_time")]
    pub cycle_s: f64,
    /// Lower bound on the sleep between cycles when a tick overruns.
    pub min_tick_ms: u64,
    /// Bounded wait for the previous cycle task during reconfiguration.
    pub cancel_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            cycle_s: 3.0,
            min_tick_ms: 50,
            cancel_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Boarding {
    /// Board at most this many passengers from a group that does not fit.
    /// Absent means board as many as capacity allows.
    pub partial_limit: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    #[default]
    Never,
    Daily,
    Hourly,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    pub rotation: Rotation,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub building: Building,
    pub timing: Timing,
    pub boarding: Boarding,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Building
        let b = &self.building;
        if b.lowest_floor > b.highest_floor {
            eyre::bail!(
                "building.lowest_floor ({}) must be <= building.highest_floor ({})",
                b.lowest_floor,
                b.highest_floor
            );
        }
        if b.capacity == 0 {
            eyre::bail!("building.capacity must be >= 1");
        }
        if !(b.lowest_floor..=b.highest_floor).contains(&b.start_floor) {
            eyre::bail!(
                "building.start_floor ({}) must be within {}..={}",
                b.start_floor,
                b.lowest_floor,
                b.highest_floor
            );
        }

        // Timing
        let t = &self.timing;
        if !(MIN_CYCLE_S..=MAX_CYCLE_S).contains(&t.cycle_s) {
            eyre::bail!("timing.cycle_s must be in [{MIN_CYCLE_S}, {MAX_CYCLE_S}]");
        }
        if t.min_tick_ms == 0 {
            eyre::bail!("timing.min_tick_ms must be >= 1");
        }
        if t.cancel_timeout_ms == 0 {
            eyre::bail!("timing.cancel_timeout_ms must be >= 1");
        }

        // Boarding: zero would strand every oversized group forever
        if self.boarding.partial_limit == Some(0) {
            eyre::bail!("boarding.partial_limit must be >= 1 when set");
        }

        // Logging
        if let Some(level) = self.logging.level.as_deref()
            && !matches!(
                level.to_ascii_lowercase().as_str(),
                "error" | "warn" | "info" | "debug" | "trace"
            )
        {
            eyre::bail!("logging.level must be one of error|warn|info|debug|trace");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = load_toml("").expect("parse empty");
        assert_eq!(cfg.building.lowest_floor, -1);
        assert_eq!(cfg.building.highest_floor, 5);
        assert_eq!(cfg.building.capacity, 8);
        assert_eq!(cfg.building.start_floor, 0);
        assert!((cfg.timing.cycle_s - 3.0).abs() < f64::EPSILON);
        assert_eq!(cfg.logging.rotation, Rotation::Never);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn cycle_time_alias_is_accepted() {
        let cfg = load_toml("[timing]\ncycle_time = 2.5\n").expect("parse");
        assert!((cfg.timing.cycle_s - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_rotation_is_a_parse_error() {
        assert!(load_toml("[logging]\nrotation = \"weekly\"\n").is_err());
    }
}
