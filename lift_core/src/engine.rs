//! One car plus its waiting registry: the synchronous core of a simulation.
//!
//! `Engine` has no locking or timing of its own. The harness owns one behind
//! the simulation lock and calls `tick` once per cycle.

use crate::boarding::{BoardingPolicy, BoardingReport, board_at};
use crate::car::Car;
use crate::config::SimConfig;
use crate::dispatch::{self, Tick};
use crate::error::{LiftError, Result};
use crate::snapshot::Snapshot;
use crate::types::{CallDirection, Floor, display_floor};
use crate::waiting::{Group, WaitingRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    /// Present when the car stopped this tick.
    pub boarding: Option<BoardingReport>,
}

#[derive(Debug, Clone)]
pub struct Engine {
    car: Car,
    waiting: WaitingRegistry,
}

impl Engine {
    pub fn new(config: &SimConfig) -> Result<Self> {
        Ok(Self {
            car: Car::new(
                config.lowest_floor,
                config.highest_floor,
                config.capacity,
                config.start_floor,
            )?,
            waiting: WaitingRegistry::new(),
        })
    }

    pub fn car(&self) -> &Car {
        &self.car
    }

    pub fn waiting(&self) -> &WaitingRegistry {
        &self.waiting
    }

    /// Queue `count` passengers at `floor` travelling to `destination`.
    pub fn submit_call(
        &mut self,
        floor: Floor,
        destination: Floor,
        count: u32,
    ) -> Result<CallDirection> {
        if !self.car.is_valid_floor(floor) {
            return Err(invalid(format!("bad floor {floor}")));
        }
        if !self.car.is_valid_floor(destination) {
            return Err(invalid(format!("bad destination {destination}")));
        }
        if count < 1 {
            return Err(invalid(format!("bad passenger count {count}")));
        }
        let direction = CallDirection::between(floor, destination)
            .ok_or_else(|| invalid(format!("floor equals destination ({floor})")))?;

        self.waiting.push(
            floor,
            direction,
            Group {
                destination,
                count,
            },
        )?;
        self.car.register_external_call(floor, direction)?;
        tracing::info!(
            floor = %display_floor(floor),
            destination = %display_floor(destination),
            count,
            %direction,
            "call queued"
        );
        Ok(direction)
    }

    /// Summon the car without a committed destination.
    pub fn submit_ping(&mut self, floor: Floor, direction: CallDirection) -> Result<()> {
        self.car.register_external_call(floor, direction)
    }

    /// Dispatch one tick and board passengers if the car stopped.
    pub fn tick(&mut self, policy: &dyn BoardingPolicy) -> TickReport {
        let tick = dispatch::tick(&mut self.car);
        let boarding = tick
            .stopped_at()
            .map(|floor| board_at(&mut self.car, &mut self.waiting, floor, tick.arrival, policy));
        tracing::debug!(status = %self.status_line(), "tick done");
        TickReport { tick, boarding }
    }

    pub fn snapshot(&self, generation: u64, cycle_s: f64) -> Snapshot {
        Snapshot::capture(&self.car, &self.waiting, generation, cycle_s)
    }

    /// One-line human summary, e.g.
    /// `Floor: G [-1..5] ▲ Dir: up | Load: 1/2 | Summary: [1▲3] | Stops: [3]`.
    pub fn status_line(&self) -> String {
        let car = &self.car;
        let stops = car.stop_floors();
        let stops = if stops.is_empty() {
            "None".to_string()
        } else {
            let labels: Vec<String> = stops.into_iter().map(display_floor).collect();
            format!("[{}]", labels.join(", "))
        };
        format!(
            "Floor: {} [{}..{}] {} Dir: {} | Load: {}/{} | Summary: [{}] | Stops: {}",
            display_floor(car.floor()),
            display_floor(car.lowest()),
            display_floor(car.highest()),
            car.direction().glyph(),
            car.direction(),
            car.load(),
            car.capacity(),
            crate::snapshot::destination_summary(car),
            stops
        )
    }
}

fn invalid(msg: String) -> LiftError {
    tracing::warn!(reason = %msg, "call rejected");
    LiftError::InvalidRequest(msg)
}
