//! Elevator state: floor range, capacity, position, passengers and hall calls.
//!
//! Hall calls are kept as floor -> non-empty direction set. Passenger
//! destinations take part in path planning straight from the manifest, so a
//! destination never needs an empty placeholder entry among the calls.

use crate::error::{LiftError, Result};
use crate::types::{CallDirection, Direction, Floor, display_floor};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

#[derive(Debug, Clone)]
pub struct Car {
    lowest: Floor,
    highest: Floor,
    capacity: usize,
    floor: Floor,
    direction: Direction,
    manifest: Vec<Floor>,
    calls: BTreeMap<Floor, BTreeSet<CallDirection>>,
}

impl Car {
    /// Check construction parameters without building anything.
    pub fn validate_construction(
        lowest: Floor,
        highest: Floor,
        capacity: usize,
        start: Floor,
    ) -> Result<()> {
        if lowest > highest {
            return Err(LiftError::Config(format!(
                "lowest floor ({lowest}) cannot be higher than highest floor ({highest})"
            )));
        }
        if capacity < 1 {
            return Err(LiftError::Config("capacity must be a positive integer".into()));
        }
        if !(lowest..=highest).contains(&start) {
            return Err(LiftError::Config(format!(
                "start floor ({start}) must be between {lowest} and {highest}"
            )));
        }
        Ok(())
    }

    pub fn new(lowest: Floor, highest: Floor, capacity: usize, start: Floor) -> Result<Self> {
        Self::validate_construction(lowest, highest, capacity, start)?;
        tracing::info!(
            floor = %display_floor(start),
            lowest = %display_floor(lowest),
            highest = %display_floor(highest),
            capacity,
            "car initialised"
        );
        Ok(Self {
            lowest,
            highest,
            capacity,
            floor: start,
            direction: Direction::Idle,
            manifest: Vec::new(),
            calls: BTreeMap::new(),
        })
    }

    pub fn lowest(&self) -> Floor {
        self.lowest
    }
    pub fn highest(&self) -> Floor {
        self.highest
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn floor(&self) -> Floor {
        self.floor
    }
    pub fn direction(&self) -> Direction {
        self.direction
    }
    pub fn manifest(&self) -> &[Floor] {
        &self.manifest
    }
    pub fn load(&self) -> usize {
        self.manifest.len()
    }
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.manifest.len())
    }
    pub fn is_full(&self) -> bool {
        self.manifest.len() >= self.capacity
    }

    pub fn is_valid_floor(&self, floor: Floor) -> bool {
        (self.lowest..=self.highest).contains(&floor)
    }

    /// Hall call directions pending at `floor`.
    pub fn calls_at(&self, floor: Floor) -> Option<&BTreeSet<CallDirection>> {
        self.calls.get(&floor)
    }

    pub fn calls(&self) -> &BTreeMap<Floor, BTreeSet<CallDirection>> {
        &self.calls
    }

    /// Every floor the car still has a reason to visit: passenger
    /// destinations and hall calls.
    pub fn targets(&self) -> BTreeSet<Floor> {
        self.manifest
            .iter()
            .copied()
            .chain(self.calls.keys().copied())
            .collect()
    }

    pub fn has_targets(&self) -> bool {
        !self.manifest.is_empty() || !self.calls.is_empty()
    }

    pub fn has_target_above(&self, floor: Floor) -> bool {
        self.manifest.iter().any(|&f| f > floor)
            || self.calls
                .range((Bound::Excluded(floor), Bound::Unbounded))
                .next()
                .is_some()
    }

    pub fn has_target_below(&self, floor: Floor) -> bool {
        self.manifest.iter().any(|&f| f < floor) || self.calls.range(..floor).next().is_some()
    }

    /// Whether any target lies further along `direction` from the current floor.
    pub fn has_target_ahead(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.has_target_above(self.floor),
            Direction::Down => self.has_target_below(self.floor),
            Direction::Idle => false,
        }
    }

    /// Sorted floors with a pending stop (hall call or passenger destination).
    pub fn stop_floors(&self) -> Vec<Floor> {
        self.targets().into_iter().collect()
    }

    /// Record a hall call. An idle car adopts the call's direction.
    pub fn register_external_call(&mut self, floor: Floor, direction: CallDirection) -> Result<()> {
        if !self.is_valid_floor(floor) {
            tracing::warn!(floor, "external call for floor outside the building ignored");
            return Err(LiftError::InvalidRequest(format!(
                "floor {floor} is outside {}..={}",
                self.lowest, self.highest
            )));
        }
        self.calls.entry(floor).or_default().insert(direction);
        tracing::info!(floor = %display_floor(floor), %direction, "external call registered");

        if self.direction == Direction::Idle {
            self.direction = direction.into();
            tracing::info!(
                floor = %display_floor(self.floor),
                %direction,
                "idle car takes direction from call"
            );
        }
        Ok(())
    }

    /// Check whether one passenger for `destination` could board right now.
    pub fn check_boarding(&self, destination: Floor) -> Result<()> {
        if !self.is_valid_floor(destination) {
            return Err(LiftError::InvalidRequest(format!(
                "destination {destination} is outside {}..={}",
                self.lowest, self.highest
            )));
        }
        if destination == self.floor {
            return Err(LiftError::InvalidRequest(format!(
                "destination {} is the current floor",
                display_floor(destination)
            )));
        }
        if self.is_full() {
            return Err(LiftError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Board a single passenger. Returns false when the destination is
    /// invalid or the car is already at capacity.
    pub fn board_one(&mut self, destination: Floor) -> bool {
        if let Err(e) = self.check_boarding(destination) {
            tracing::debug!(error = %e, "boarding refused");
            return false;
        }
        self.manifest.push(destination);
        tracing::debug!(
            destination = %display_floor(destination),
            load = self.load(),
            capacity = self.capacity,
            "passenger boarded"
        );
        true
    }

    /// Remove every passenger whose destination is the current floor.
    pub fn alight_at_current_floor(&mut self) -> usize {
        let before = self.manifest.len();
        let floor = self.floor;
        self.manifest.retain(|&d| d != floor);
        before - self.manifest.len()
    }

    /// Drop all hall calls at `floor`, returning the directions consumed.
    pub(crate) fn clear_calls_at(&mut self, floor: Floor) -> BTreeSet<CallDirection> {
        self.calls.remove(&floor).unwrap_or_default()
    }

    pub(crate) fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Move exactly one floor along `direction`, clamped to the building.
    pub(crate) fn advance(&mut self, direction: CallDirection) -> Floor {
        self.floor = match direction {
            CallDirection::Up => (self.floor + 1).min(self.highest),
            CallDirection::Down => (self.floor - 1).max(self.lowest),
        };
        self.floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car() -> Car {
        Car::new(-1, 5, 2, 0).unwrap()
    }

    #[test]
    fn construction_rejects_bad_parameters() {
        assert!(matches!(Car::new(3, 1, 1, 2), Err(LiftError::Config(_))));
        assert!(matches!(Car::new(0, 5, 0, 0), Err(LiftError::Config(_))));
        assert!(matches!(Car::new(0, 5, 1, 6), Err(LiftError::Config(_))));
        assert!(Car::new(0, 0, 1, 0).is_ok());
    }

    #[test]
    fn first_call_sets_idle_direction() {
        let mut c = car();
        c.register_external_call(4, CallDirection::Down).unwrap();
        assert_eq!(c.direction(), Direction::Down);
        c.register_external_call(5, CallDirection::Up).unwrap();
        assert_eq!(c.direction(), Direction::Down);
    }

    #[test]
    fn repeated_call_is_idempotent() {
        let mut c = car();
        c.register_external_call(3, CallDirection::Up).unwrap();
        let first = c.calls().clone();
        c.register_external_call(3, CallDirection::Up).unwrap();
        assert_eq!(c.calls(), &first);
    }

    #[test]
    fn out_of_range_call_changes_nothing() {
        let mut c = car();
        let err = c.register_external_call(9, CallDirection::Up).unwrap_err();
        assert!(matches!(err, LiftError::InvalidRequest(_)));
        assert!(c.calls().is_empty());
        assert_eq!(c.direction(), Direction::Idle);
    }

    #[test]
    fn board_one_enforces_contract() {
        let mut c = car();
        assert!(!c.board_one(0), "destination equals current floor");
        assert!(!c.board_one(7), "destination outside building");
        assert!(c.board_one(3));
        assert!(c.board_one(-1));
        assert!(!c.board_one(4), "car is full");
        assert_eq!(
            c.check_boarding(4),
            Err(LiftError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(c.load(), 2);
        assert_eq!(c.stop_floors(), vec![-1, 3]);
    }

    #[test]
    fn alight_removes_all_matching_destinations() {
        let mut c = Car::new(0, 5, 4, 0).unwrap();
        c.board_one(2);
        c.board_one(2);
        c.board_one(4);
        c.floor = 2;
        assert_eq!(c.alight_at_current_floor(), 2);
        assert_eq!(c.manifest(), &[4]);
        assert_eq!(c.alight_at_current_floor(), 0);
    }

    #[test]
    fn target_queries_include_calls_and_manifest() {
        let mut c = car();
        c.board_one(3);
        c.register_external_call(-1, CallDirection::Up).unwrap();
        assert!(c.has_target_above(0));
        assert!(c.has_target_below(0));
        assert!(!c.has_target_above(3));
        assert_eq!(c.targets().into_iter().collect::<Vec<_>>(), vec![-1, 3]);
    }

    #[test]
    fn advance_never_leaves_building() {
        let mut c = Car::new(0, 1, 1, 1).unwrap();
        assert_eq!(c.advance(CallDirection::Up), 1);
        assert_eq!(c.advance(CallDirection::Down), 0);
        assert_eq!(c.advance(CallDirection::Down), 0);
    }
}
