//! Observer-facing view of the simulation, taken once per cycle.

use crate::car::Car;
use crate::types::{Direction, Floor, display_floor};
use crate::waiting::WaitingRegistry;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Configuration generation this snapshot belongs to.
    pub generation: u64,
    pub lowest_floor: Floor,
    pub highest_floor: Floor,
    pub capacity: usize,
    pub current_floor: Floor,
    pub direction: Direction,
    pub current_load: usize,
    pub destination_summary: String,
    pub stop_floors: Vec<Floor>,
    pub waiting: WaitingRegistry,
    pub cycle_s: f64,
}

impl Snapshot {
    pub fn capture(car: &Car, waiting: &WaitingRegistry, generation: u64, cycle_s: f64) -> Self {
        Self {
            generation,
            lowest_floor: car.lowest(),
            highest_floor: car.highest(),
            capacity: car.capacity(),
            current_floor: car.floor(),
            direction: car.direction(),
            current_load: car.load(),
            destination_summary: destination_summary(car),
            stop_floors: car.stop_floors(),
            waiting: waiting.clone(),
            cycle_s,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// `"{count}{glyph}{floor}"` per distinct destination, e.g. `2▲5, 1▼G`.
pub fn destination_summary(car: &Car) -> String {
    if car.manifest().is_empty() {
        return "Empty".to_string();
    }
    let mut counts: BTreeMap<Floor, usize> = BTreeMap::new();
    for &d in car.manifest() {
        *counts.entry(d).or_default() += 1;
    }
    let here = car.floor();
    counts
        .into_iter()
        .map(|(floor, count)| {
            let glyph = match floor.cmp(&here) {
                std::cmp::Ordering::Greater => '▲',
                std::cmp::Ordering::Less => '▼',
                std::cmp::Ordering::Equal => match car.direction() {
                    Direction::Idle => '●',
                    d => d.glyph(),
                },
            };
            format!("{count}{glyph}{}", display_floor(floor))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
