//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use lift_core::Floor;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "lift", version, about = "Single-car lift simulation")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/lift.toml")]
    pub config: PathBuf,

    /// Log and report errors as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulation, reading JSON requests from stdin and writing
    /// snapshots as JSON lines to stdout
    Run {
        /// Stop after this many snapshots (the configuration snapshot counts)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
    },
    /// Validate the config file and print the effective settings
    Check,
    /// Drive the engine synchronously for a fixed number of ticks
    Step {
        /// Calls as FLOOR:DEST[:COUNT], comma separated (e.g. "0:3:1,4:1:3")
        #[arg(long, value_name = "CALLS", value_delimiter = ',')]
        calls: Vec<CallSpec>,
        /// Number of ticks to run
        #[arg(long, value_name = "N", default_value_t = 10)]
        ticks: u32,
    },
}

/// One scripted call for `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSpec {
    pub floor: Floor,
    pub destination: Floor,
    pub count: u32,
}

impl FromStr for CallSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let num = |p: &str, what: &str| -> Result<i64, String> {
            p.trim()
                .parse::<i64>()
                .map_err(|_| format!("{what} `{p}` is not an integer in `{s}`"))
        };
        let floor_of = |p: &str, what: &str| -> Result<Floor, String> {
            let n = num(p, what)?;
            Floor::try_from(n).map_err(|_| format!("{what} {n} is out of range in `{s}`"))
        };
        let (floor, destination, count) = match parts.as_slice() {
            [f, d] => (floor_of(f, "floor")?, floor_of(d, "destination")?, 1),
            [f, d, c] => (floor_of(f, "floor")?, floor_of(d, "destination")?, num(c, "count")?),
            _ => return Err(format!("expected FLOOR:DEST[:COUNT], got `{s}`")),
        };
        let count = u32::try_from(count)
            .ok()
            .filter(|c| *c >= 1)
            .ok_or_else(|| format!("count must be a positive integer in `{s}`"))?;
        Ok(Self {
            floor,
            destination,
            count,
        })
    }
}
