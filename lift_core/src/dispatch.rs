//! Per-tick dispatch: decide whether the car stops at its floor or moves.
//!
//! The policy is a SCAN sweep with opportunistic turnaround pickup. A tick
//! produces at most one stop or one floor move, never both.

use crate::car::Car;
use crate::error::LiftError;
use crate::types::{CallDirection, Direction, Floor, display_floor};
use std::collections::BTreeSet;

/// Why the car stopped, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A passenger on board is travelling to this floor.
    Destination,
    /// The car was idle and a call is waiting here.
    IdlePickup,
    /// A call here matches the travel direction.
    DirectionalPickup,
    /// A call here wants the opposite direction and nothing lies further ahead.
    TurnaroundPickup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Stopped {
        floor: Floor,
        reason: StopReason,
        alighted: usize,
        /// Call directions consumed at this floor.
        cleared: BTreeSet<CallDirection>,
    },
    Moved {
        from: Floor,
        to: Floor,
    },
    /// Direction changed in place (sweep reversal, idle start or settling).
    Turned {
        from: Direction,
        to: Direction,
    },
    /// Nothing to do.
    Held,
}

/// Result of one dispatch tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Direction the car had when the tick began.
    pub arrival: Direction,
    pub outcome: TickOutcome,
}

impl Tick {
    pub fn stopped_at(&self) -> Option<Floor> {
        match self.outcome {
            TickOutcome::Stopped { floor, .. } => Some(floor),
            _ => None,
        }
    }
}

/// Evaluate the stop rules at the car's current floor.
pub fn stop_reason(car: &Car) -> Option<StopReason> {
    let floor = car.floor();
    if car.manifest().contains(&floor) {
        return Some(StopReason::Destination);
    }
    let here = car.calls_at(floor)?;
    if car.is_full() {
        tracing::debug!(floor = %display_floor(floor), "car full, pickup skipped");
        return None;
    }
    match car.direction().as_call() {
        None => Some(StopReason::IdlePickup),
        Some(d) if here.contains(&d) => Some(StopReason::DirectionalPickup),
        Some(d) if here.contains(&d.opposite()) && !car.has_target_ahead(car.direction()) => {
            Some(StopReason::TurnaroundPickup)
        }
        Some(_) => None,
    }
}

/// Run one dispatch tick against the car.
pub fn tick(car: &mut Car) -> Tick {
    let arrival = car.direction();
    let floor = car.floor();

    if let Some(reason) = stop_reason(car) {
        let alighted = car.alight_at_current_floor();
        let cleared = car.clear_calls_at(floor);
        tracing::info!(
            floor = %display_floor(floor),
            ?reason,
            alighted,
            load = car.load(),
            "stopped"
        );
        return Tick {
            arrival,
            outcome: TickOutcome::Stopped {
                floor,
                reason,
                alighted,
                cleared,
            },
        };
    }

    if let Some(here) = car.calls_at(floor) {
        tracing::debug!(
            floor = %display_floor(floor),
            requests = ?here,
            direction = %arrival,
            load = car.load(),
            "call deferred"
        );
    }

    let outcome = match arrival.as_call() {
        Some(d) => sweep(car, d),
        None => start_from_idle(car),
    };
    Tick { arrival, outcome }
}

fn sweep(car: &mut Car, d: CallDirection) -> TickOutcome {
    let from = car.floor();
    let at_limit = match d {
        CallDirection::Up => from >= car.highest(),
        CallDirection::Down => from <= car.lowest(),
    };
    if !at_limit && car.has_target_ahead(d.into()) {
        let to = car.advance(d);
        tracing::debug!(from = %display_floor(from), to = %display_floor(to), "moved");
        return TickOutcome::Moved { from, to };
    }

    let behind: Direction = d.opposite().into();
    let to = if car.has_target_ahead(behind) {
        behind
    } else {
        if car.has_targets() {
            let err = LiftError::Inconsistency(format!(
                "end of sweep at {} with targets {:?} and load {}",
                display_floor(from),
                car.targets(),
                car.load()
            ));
            tracing::warn!(error = %err, "forcing idle");
        }
        Direction::Idle
    };
    car.set_direction(to);
    tracing::info!(floor = %display_floor(from), from = %Direction::from(d), %to, "sweep ended");
    TickOutcome::Turned {
        from: d.into(),
        to,
    }
}

fn start_from_idle(car: &mut Car) -> TickOutcome {
    let floor = car.floor();
    let to = if car.has_target_above(floor) {
        Direction::Up
    } else if car.has_target_below(floor) {
        Direction::Down
    } else {
        return TickOutcome::Held;
    };
    car.set_direction(to);
    tracing::info!(floor = %display_floor(floor), %to, "leaving idle for pending targets");
    TickOutcome::Turned {
        from: Direction::Idle,
        to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car_at(floor: Floor, capacity: usize) -> Car {
        Car::new(-1, 5, capacity, floor).unwrap()
    }

    #[test]
    fn destination_beats_everything() {
        let mut c = car_at(0, 2);
        c.board_one(2);
        c.set_direction(Direction::Up);
        c.advance(CallDirection::Up);
        c.advance(CallDirection::Up);
        c.register_external_call(2, CallDirection::Down).unwrap();
        assert_eq!(stop_reason(&c), Some(StopReason::Destination));
        let t = tick(&mut c);
        match t.outcome {
            TickOutcome::Stopped {
                alighted, cleared, ..
            } => {
                assert_eq!(alighted, 1);
                assert!(cleared.contains(&CallDirection::Down));
            }
            other => panic!("expected stop, got {other:?}"),
        }
        assert!(c.calls_at(2).is_none());
    }

    #[test]
    fn idle_pickup_accepts_any_direction() {
        let mut c = car_at(3, 1);
        c.register_external_call(3, CallDirection::Down).unwrap();
        c.set_direction(Direction::Idle);
        assert_eq!(stop_reason(&c), Some(StopReason::IdlePickup));
    }

    #[test]
    fn full_car_skips_pickups() {
        let mut c = car_at(0, 1);
        c.board_one(4);
        c.set_direction(Direction::Up);
        c.register_external_call(1, CallDirection::Up).unwrap();
        c.advance(CallDirection::Up);
        assert_eq!(stop_reason(&c), None);
        assert_eq!(tick(&mut c).outcome, TickOutcome::Moved { from: 1, to: 2 });
        assert!(c.calls_at(1).is_some(), "skipped call stays registered");
    }

    #[test]
    fn opposite_call_waits_while_targets_remain_ahead() {
        let mut c = car_at(0, 2);
        c.board_one(4);
        c.set_direction(Direction::Up);
        c.register_external_call(2, CallDirection::Down).unwrap();
        c.advance(CallDirection::Up);
        c.advance(CallDirection::Up);
        assert_eq!(stop_reason(&c), None);
        assert_eq!(tick(&mut c).outcome, TickOutcome::Moved { from: 2, to: 3 });
    }

    #[test]
    fn opposite_call_at_sweep_end_is_turnaround() {
        let mut c = car_at(2, 2);
        c.set_direction(Direction::Up);
        c.register_external_call(2, CallDirection::Down).unwrap();
        assert_eq!(stop_reason(&c), Some(StopReason::TurnaroundPickup));
    }

    #[test]
    fn sweep_end_reverses_when_targets_behind() {
        let mut c = car_at(3, 2);
        c.register_external_call(1, CallDirection::Up).unwrap();
        c.set_direction(Direction::Up);
        let t = tick(&mut c);
        assert_eq!(
            t.outcome,
            TickOutcome::Turned {
                from: Direction::Up,
                to: Direction::Down
            }
        );
        assert_eq!(c.floor(), 3, "reversal does not move");
    }

    #[test]
    fn sweep_end_without_targets_goes_idle() {
        let mut c = car_at(3, 2);
        c.set_direction(Direction::Down);
        tick(&mut c);
        assert_eq!(c.direction(), Direction::Idle);
    }

    #[test]
    fn never_moves_above_top_floor() {
        let mut c = car_at(5, 2);
        c.set_direction(Direction::Up);
        c.register_external_call(2, CallDirection::Up).unwrap();
        let t = tick(&mut c);
        assert!(matches!(t.outcome, TickOutcome::Turned { .. }));
        assert_eq!(c.floor(), 5);
    }

    #[test]
    fn idle_prefers_up_when_targets_both_ways() {
        let mut c = car_at(2, 2);
        c.register_external_call(0, CallDirection::Up).unwrap();
        c.set_direction(Direction::Idle);
        c.register_external_call(4, CallDirection::Down).unwrap();
        c.set_direction(Direction::Idle);
        assert_eq!(
            tick(&mut c).outcome,
            TickOutcome::Turned {
                from: Direction::Idle,
                to: Direction::Up
            }
        );
    }

    #[test]
    fn idle_without_targets_holds() {
        let mut c = car_at(0, 2);
        assert_eq!(tick(&mut c).outcome, TickOutcome::Held);
        assert_eq!(c.direction(), Direction::Idle);
    }
}
