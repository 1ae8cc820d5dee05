//! Boarding at a floor where the car has just stopped.
//!
//! Waiting groups are drained in arrival order. A group larger than the room
//! left in the car is a partial fit; a `BoardingPolicy` decides inline how
//! many of its members get on and the remainder keeps its place in the queue.

use crate::car::Car;
use crate::types::{CallDirection, Direction, Floor, display_floor};
use crate::waiting::{Group, WaitingRegistry};
use std::collections::VecDeque;

/// A waiting group that does not fit in the remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialBoarding {
    pub floor: Floor,
    pub direction: CallDirection,
    pub destination: Floor,
    pub waiting: u32,
    /// Room left in the car; the most that may board.
    pub boardable: u32,
}

/// Decides how many members of a partially fitting group board.
pub trait BoardingPolicy: Send + Sync {
    fn resolve(&self, pending: &PartialBoarding) -> u32;
}

/// Unattended default: fill the car.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaximizeBoarding;

impl BoardingPolicy for MaximizeBoarding {
    fn resolve(&self, pending: &PartialBoarding) -> u32 {
        pending.boardable
    }
}

/// Board at most this many passengers out of any group that does not fit.
#[derive(Debug, Clone, Copy)]
pub struct PartialLimit(pub u32);

impl BoardingPolicy for PartialLimit {
    fn resolve(&self, pending: &PartialBoarding) -> u32 {
        self.0.min(pending.boardable)
    }
}

impl<F> BoardingPolicy for F
where
    F: Fn(&PartialBoarding) -> u32 + Send + Sync,
{
    fn resolve(&self, pending: &PartialBoarding) -> u32 {
        self(pending)
    }
}

/// Ask the policy and clamp its answer to `[0, boardable]`.
pub fn resolve_partial_boarding(policy: &dyn BoardingPolicy, pending: &PartialBoarding) -> u32 {
    policy.resolve(pending).min(pending.boardable)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BoardingReport {
    pub boarded: u32,
    /// Partial fits met during this stop with the count that boarded.
    pub partials: Vec<(PartialBoarding, u32)>,
    /// Direction re-registered because passengers are still waiting here.
    pub rearmed: Option<CallDirection>,
}

/// Board waiting passengers at `floor`. `arrival` is the car's direction
/// when the stop happened and picks which queue is served first.
pub fn board_at(
    car: &mut Car,
    waiting: &mut WaitingRegistry,
    floor: Floor,
    arrival: Direction,
    policy: &dyn BoardingPolicy,
) -> BoardingReport {
    let mut report = BoardingReport::default();
    tracing::debug!(floor = %display_floor(floor), %arrival, "boarding start");

    match arrival {
        Direction::Idle => {
            board_queue(car, waiting, floor, CallDirection::Up, policy, &mut report);
            if !car.is_full() {
                board_queue(car, waiting, floor, CallDirection::Down, policy, &mut report);
            }
        }
        Direction::Up | Direction::Down => {
            let (ahead, behind) = match arrival {
                Direction::Up => (CallDirection::Up, CallDirection::Down),
                _ => (CallDirection::Down, CallDirection::Up),
            };
            board_queue(car, waiting, floor, ahead, policy, &mut report);
            if !car.has_target_ahead(arrival) && !car.is_full() {
                tracing::debug!(floor = %display_floor(floor), "turnaround boarding");
                board_queue(car, waiting, floor, behind, policy, &mut report);
            }
        }
    }

    let up = waiting.has_waiting(floor, CallDirection::Up);
    let down = waiting.has_waiting(floor, CallDirection::Down);
    if up || down {
        let d = if up {
            CallDirection::Up
        } else {
            CallDirection::Down
        };
        tracing::info!(floor = %display_floor(floor), direction = %d, "passengers left waiting, stop re-armed");
        if car.register_external_call(floor, d).is_ok() {
            report.rearmed = Some(d);
        }
    }

    if report.boarded > 0 && arrival == Direction::Idle {
        let next = if car.manifest().iter().any(|&p| p > floor) {
            Some(Direction::Up)
        } else if car.manifest().iter().any(|&p| p < floor) {
            Some(Direction::Down)
        } else {
            None
        };
        if let Some(d) = next {
            car.set_direction(d);
            tracing::info!(direction = %d, "direction set from passenger destinations");
        }
    }

    report
}

fn board_queue(
    car: &mut Car,
    waiting: &mut WaitingRegistry,
    floor: Floor,
    direction: CallDirection,
    policy: &dyn BoardingPolicy,
    report: &mut BoardingReport,
) {
    let queue = waiting.take(floor, direction);
    if queue.is_empty() {
        return;
    }
    let mut kept = VecDeque::with_capacity(queue.len());

    for group in queue {
        let room = u32::try_from(car.remaining_capacity()).unwrap_or(u32::MAX);
        if room == 0 {
            kept.push_back(group);
            continue;
        }
        let take = if room >= group.count {
            group.count
        } else {
            let pending = PartialBoarding {
                floor,
                direction,
                destination: group.destination,
                waiting: group.count,
                boardable: room,
            };
            let n = resolve_partial_boarding(policy, &pending);
            tracing::info!(
                destination = %display_floor(group.destination),
                waiting = group.count,
                boardable = room,
                boarding = n,
                "partial fit resolved"
            );
            report.partials.push((pending, n));
            n
        };

        let boarded = board_group(car, group.destination, take);
        report.boarded += boarded;
        if boarded < take {
            tracing::error!(
                destination = %display_floor(group.destination),
                expected = take,
                boarded,
                "boarding failed despite capacity, group aborted"
            );
        }
        let left = group.count - boarded;
        if left > 0 {
            kept.push_back(Group {
                destination: group.destination,
                count: left,
            });
        }
    }

    waiting.restore(floor, direction, kept);
}

fn board_group(car: &mut Car, destination: Floor, count: u32) -> u32 {
    let mut boarded = 0;
    while boarded < count && car.board_one(destination) {
        boarded += 1;
    }
    boarded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(capacity: usize, floor: Floor) -> (Car, WaitingRegistry) {
        (Car::new(-1, 5, capacity, floor).unwrap(), WaitingRegistry::new())
    }

    fn group(destination: Floor, count: u32) -> Group {
        Group { destination, count }
    }

    #[test]
    fn whole_group_boards_when_it_fits() {
        let (mut car, mut w) = setup(4, 0);
        w.push(0, CallDirection::Up, group(3, 3)).unwrap();
        let r = board_at(&mut car, &mut w, 0, Direction::Idle, &MaximizeBoarding);
        assert_eq!(r.boarded, 3);
        assert!(r.partials.is_empty());
        assert!(w.is_empty());
        assert_eq!(car.direction(), Direction::Up);
    }

    #[test]
    fn partial_fit_boards_max_and_rearms() {
        let (mut car, mut w) = setup(1, 0);
        w.push(0, CallDirection::Up, group(3, 2)).unwrap();
        let r = board_at(&mut car, &mut w, 0, Direction::Idle, &MaximizeBoarding);
        assert_eq!(r.boarded, 1);
        assert_eq!(r.partials.len(), 1);
        assert_eq!(r.partials[0].0.boardable, 1);
        assert_eq!(r.rearmed, Some(CallDirection::Up));
        assert_eq!(
            w.groups(0, CallDirection::Up).copied().collect::<Vec<_>>(),
            vec![group(3, 1)]
        );
        assert!(car.calls_at(0).is_some());
    }

    #[test]
    fn full_car_leaves_later_groups_in_order() {
        let (mut car, mut w) = setup(2, 1);
        w.push(1, CallDirection::Up, group(4, 2)).unwrap();
        w.push(1, CallDirection::Up, group(5, 1)).unwrap();
        board_at(&mut car, &mut w, 1, Direction::Up, &MaximizeBoarding);
        assert_eq!(car.load(), 2);
        assert_eq!(
            w.groups(1, CallDirection::Up).copied().collect::<Vec<_>>(),
            vec![group(5, 1)]
        );
    }

    #[test]
    fn moving_car_skips_opposite_queue_while_targets_ahead() {
        let (mut car, mut w) = setup(4, 2);
        car.set_direction(Direction::Up);
        w.push(2, CallDirection::Up, group(4, 1)).unwrap();
        w.push(2, CallDirection::Down, group(0, 1)).unwrap();
        let r = board_at(&mut car, &mut w, 2, Direction::Up, &MaximizeBoarding);
        assert_eq!(r.boarded, 1);
        assert_eq!(car.manifest(), &[4]);
        assert_eq!(r.rearmed, Some(CallDirection::Down));
    }

    #[test]
    fn turnaround_boards_opposite_queue_at_sweep_end() {
        let (mut car, mut w) = setup(4, 3);
        car.set_direction(Direction::Up);
        w.push(3, CallDirection::Down, group(0, 2)).unwrap();
        let r = board_at(&mut car, &mut w, 3, Direction::Up, &MaximizeBoarding);
        assert_eq!(r.boarded, 2);
        assert_eq!(r.rearmed, None);
        assert_eq!(car.direction(), Direction::Up, "moving arrival keeps direction");
    }

    #[test]
    fn both_queues_waiting_rearms_up() {
        let (mut car, mut w) = setup(1, 2);
        car.board_one(5);
        w.push(2, CallDirection::Up, group(4, 1)).unwrap();
        w.push(2, CallDirection::Down, group(0, 1)).unwrap();
        let r = board_at(&mut car, &mut w, 2, Direction::Idle, &MaximizeBoarding);
        assert_eq!(r.boarded, 0);
        assert_eq!(r.rearmed, Some(CallDirection::Up));
    }

    #[test]
    fn policy_answers_are_clamped() {
        let greedy = |_: &PartialBoarding| -> u32 { 99 };
        let pending = PartialBoarding {
            floor: 0,
            direction: CallDirection::Up,
            destination: 3,
            waiting: 5,
            boardable: 2,
        };
        assert_eq!(resolve_partial_boarding(&greedy, &pending), 2);
        assert_eq!(resolve_partial_boarding(&PartialLimit(1), &pending), 1);
        assert_eq!(resolve_partial_boarding(&MaximizeBoarding, &pending), 2);
    }

    #[test]
    fn declined_partial_lets_smaller_group_behind_board() {
        let (mut car, mut w) = setup(2, 0);
        w.push(0, CallDirection::Up, group(3, 3)).unwrap();
        w.push(0, CallDirection::Up, group(4, 1)).unwrap();
        let none = |_: &PartialBoarding| -> u32 { 0 };
        let r = board_at(&mut car, &mut w, 0, Direction::Up, &none);
        assert_eq!(r.boarded, 1);
        assert_eq!(car.manifest(), &[4]);
        assert_eq!(
            w.groups(0, CallDirection::Up).copied().collect::<Vec<_>>(),
            vec![group(3, 3)]
        );
    }
}
