//! Floors and directions shared by every engine component.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Building floor number; negative floors are basements.
pub type Floor = i32;

/// Travel direction of the car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    #[default]
    Idle,
}

impl Direction {
    /// Glyph used by the status line: ▲ ▼ ■
    pub fn glyph(self) -> char {
        match self {
            Direction::Up => '▲',
            Direction::Down => '▼',
            Direction::Idle => '■',
        }
    }

    /// The hall call matching this travel direction, if moving.
    pub fn as_call(self) -> Option<CallDirection> {
        match self {
            Direction::Up => Some(CallDirection::Up),
            Direction::Down => Some(CallDirection::Down),
            Direction::Idle => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Idle => "idle",
        })
    }
}

/// Direction of a hall call or waiting group. Ordered so `Up` iterates first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Up,
    Down,
}

impl CallDirection {
    /// Direction needed to travel from `floor` to `destination`; `None` when equal.
    pub fn between(floor: Floor, destination: Floor) -> Option<Self> {
        match destination.cmp(&floor) {
            std::cmp::Ordering::Greater => Some(CallDirection::Up),
            std::cmp::Ordering::Less => Some(CallDirection::Down),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            CallDirection::Up => CallDirection::Down,
            CallDirection::Down => CallDirection::Up,
        }
    }
}

impl From<CallDirection> for Direction {
    fn from(d: CallDirection) -> Self {
        match d {
            CallDirection::Up => Direction::Up,
            CallDirection::Down => Direction::Down,
        }
    }
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Direction::from(*self).fmt(f)
    }
}

/// Human floor label: the ground floor (0) is shown as `G`.
pub fn display_floor(floor: Floor) -> String {
    if floor == 0 {
        "G".to_string()
    } else {
        floor.to_string()
    }
}
