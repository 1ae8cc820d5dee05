//! Passengers waiting at each floor, grouped per call direction in arrival order.

use crate::error::{LiftError, Result};
use crate::types::{CallDirection, Floor};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Passengers who called together for the same destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Group {
    pub destination: Floor,
    pub count: u32,
}

/// floor -> direction -> FIFO groups. Empty queues and floors are pruned eagerly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WaitingRegistry {
    floors: BTreeMap<Floor, BTreeMap<CallDirection, VecDeque<Group>>>,
}

impl WaitingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group behind everyone already waiting at `floor` for `direction`.
    pub fn push(&mut self, floor: Floor, direction: CallDirection, group: Group) -> Result<()> {
        if group.count == 0 {
            return Err(LiftError::InvalidRequest(
                "a waiting group needs at least one passenger".into(),
            ));
        }
        self.floors
            .entry(floor)
            .or_default()
            .entry(direction)
            .or_default()
            .push_back(group);
        Ok(())
    }

    pub fn groups(&self, floor: Floor, direction: CallDirection) -> impl Iterator<Item = &Group> {
        self.floors
            .get(&floor)
            .and_then(|dirs| dirs.get(&direction))
            .into_iter()
            .flatten()
    }

    pub fn has_waiting(&self, floor: Floor, direction: CallDirection) -> bool {
        self.groups(floor, direction).next().is_some()
    }

    /// Remove and return the queue for `floor`/`direction`.
    pub fn take(&mut self, floor: Floor, direction: CallDirection) -> VecDeque<Group> {
        let Some(dirs) = self.floors.get_mut(&floor) else {
            return VecDeque::new();
        };
        let queue = dirs.remove(&direction).unwrap_or_default();
        if dirs.is_empty() {
            self.floors.remove(&floor);
        }
        queue
    }

    /// Put groups back at the head of the queue, ahead of any later arrivals.
    pub fn restore(&mut self, floor: Floor, direction: CallDirection, groups: VecDeque<Group>) {
        let mut groups: VecDeque<Group> = groups.into_iter().filter(|g| g.count > 0).collect();
        if groups.is_empty() {
            return;
        }
        let queue = self
            .floors
            .entry(floor)
            .or_default()
            .entry(direction)
            .or_default();
        groups.append(queue);
        *queue = groups;
    }

    /// Total passengers waiting anywhere.
    pub fn total_waiting(&self) -> u64 {
        self.floors
            .values()
            .flat_map(|dirs| dirs.values())
            .flatten()
            .map(|g| u64::from(g.count))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    pub fn floors(&self) -> impl Iterator<Item = Floor> + '_ {
        self.floors.keys().copied()
    }
}
