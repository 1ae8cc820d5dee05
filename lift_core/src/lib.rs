#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Single-car elevator simulation core.
//!
//! ## Architecture
//!
//! - **Car**: position, direction, manifest and pending stop calls (`car` module)
//! - **Dispatch**: the per-tick stop/move/turn decision (`dispatch` module)
//! - **Waiting**: passenger groups queued per floor and direction (`waiting` module)
//! - **Boarding**: alighting, boarding and partial-fit splitting (`boarding` module)
//! - **Engine**: car plus registry, one synchronous `tick` at a time
//! - **Harness**: the periodic cycle task, reconfiguration and snapshot
//!   broadcast (`harness`, `cycle` modules)
//!
//! Floors are plain `i32`s; floor `0` is displayed as `G`.

pub mod boarding;
pub mod car;
pub mod config;
pub mod conversions;
pub mod cycle;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod harness;
pub mod mocks;
pub mod protocol;
pub mod snapshot;
pub mod types;
pub mod util;
pub mod waiting;

pub use boarding::{BoardingPolicy, MaximizeBoarding, PartialBoarding, PartialLimit};
pub use car::Car;
pub use config::SimConfig;
pub use engine::{Engine, TickReport};
pub use error::{LiftError, Result};
pub use harness::{Phase, Simulation, SimulationBuilder};
pub use protocol::{Reply, Request};
pub use snapshot::Snapshot;
pub use types::{CallDirection, Direction, Floor, display_floor};
pub use waiting::{Group, WaitingRegistry};
