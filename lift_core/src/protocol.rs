//! Request and reply messages exchanged with clients.
//!
//! Requests are JSON objects tagged by `type`:
//!
//! ```json
//! {"type": "configure", "min_floor": -1, "max_floor": 5, "capacity": 8, "start_floor": 0, "cycle_time": 3.0}
//! {"type": "call", "floor": 0, "destination": 3, "num_passengers": 2}
//! {"type": "ping", "floor": 4, "direction": "down"}
//! ```
//!
//! `boarding_decision` is still decoded so older clients get a clear error:
//! partial fits are resolved by the configured `BoardingPolicy`.

use crate::config::SimConfig;
use crate::error::{LiftError, Result};
use crate::types::{CallDirection, Floor};
use serde::{Deserialize, Serialize};

const fn one() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Omitted fields keep their current value; see [`sim_config`].
    Configure {
        #[serde(default)]
        min_floor: Option<Floor>,
        #[serde(default)]
        max_floor: Option<Floor>,
        #[serde(default)]
        capacity: Option<i64>,
        #[serde(default)]
        start_floor: Option<Floor>,
        #[serde(default)]
        cycle_time: Option<f64>,
    },
    Call {
        floor: Floor,
        destination: Floor,
        #[serde(default = "one")]
        num_passengers: i64,
    },
    Ping {
        floor: Floor,
        direction: CallDirection,
    },
    BoardingDecision {
        #[serde(default)]
        count: Option<i64>,
    },
    #[serde(other)]
    Unknown,
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configure { .. } => "configure",
            Self::Call { .. } => "call",
            Self::Ping { .. } => "ping",
            Self::BoardingDecision { .. } => "boarding_decision",
            Self::Unknown => "unknown",
        }
    }
}

/// Parse one JSON request.
pub fn decode(text: &str) -> Result<Request> {
    serde_json::from_str(text)
        .map_err(|e| LiftError::InvalidRequest(format!("malformed request: {e}")))
}

/// Build a `SimConfig` from the fields of a `configure` request.
///
/// Floors, capacity and cycle time left out of the request are taken from
/// `current`; the start floor always falls back to 0.
pub fn sim_config(
    current: &SimConfig,
    min_floor: Option<Floor>,
    max_floor: Option<Floor>,
    capacity: Option<i64>,
    start_floor: Option<Floor>,
    cycle_time: Option<f64>,
) -> Result<SimConfig> {
    let capacity = match capacity {
        Some(n) => usize::try_from(n)
            .map_err(|_| LiftError::Config(format!("capacity ({n}) must be >= 1")))?,
        None => current.capacity,
    };
    let cfg = SimConfig {
        lowest_floor: min_floor.unwrap_or(current.lowest_floor),
        highest_floor: max_floor.unwrap_or(current.highest_floor),
        capacity,
        start_floor: start_floor.unwrap_or(0),
        cycle_s: cycle_time.unwrap_or(current.cycle_s),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Convert a wire passenger count, rejecting anything below one.
pub fn passenger_count(n: i64) -> Result<u32> {
    match u32::try_from(n) {
        Ok(c) if c >= 1 => Ok(c),
        _ => Err(LiftError::InvalidRequest(format!(
            "num_passengers ({n}) must be a positive integer"
        ))),
    }
}

/// Reply written back to the submitter of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Error { message: String },
}

impl From<&LiftError> for Reply {
    fn from(e: &LiftError) -> Self {
        Self::Error {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_fields_are_optional() {
        let r = decode(r#"{"type":"configure","capacity":3}"#).unwrap();
        assert_eq!(
            r,
            Request::Configure {
                min_floor: None,
                max_floor: None,
                capacity: Some(3),
                start_floor: None,
                cycle_time: None,
            }
        );
    }

    #[test]
    fn omitted_fields_keep_current_values() {
        let current = SimConfig {
            lowest_floor: 0,
            highest_floor: 8,
            capacity: 2,
            start_floor: 4,
            cycle_s: 1.0,
        };
        let cfg = sim_config(&current, None, Some(10), None, None, None).unwrap();
        assert_eq!(cfg.lowest_floor, 0);
        assert_eq!(cfg.highest_floor, 10);
        assert_eq!(cfg.capacity, 2);
        assert_eq!(cfg.start_floor, 0);
        assert_eq!(cfg.cycle_s, 1.0);
    }

    #[test]
    fn empty_configure_uses_defaults_when_unconfigured() {
        let cfg = sim_config(&SimConfig::default(), None, None, None, None, None).unwrap();
        assert_eq!(cfg, SimConfig::default());
    }

    #[test]
    fn call_defaults_to_one_passenger() {
        let r = decode(r#"{"type":"call","floor":0,"destination":3}"#).unwrap();
        assert_eq!(
            r,
            Request::Call {
                floor: 0,
                destination: 3,
                num_passengers: 1
            }
        );
    }

    #[test]
    fn unknown_type_decodes_as_unknown() {
        let r = decode(r#"{"type":"teleport","floor":2}"#).unwrap();
        assert_eq!(r, Request::Unknown);
        assert_eq!(r.kind(), "unknown");
    }

    #[test]
    fn garbage_is_invalid_request() {
        assert!(matches!(decode("{not json"), Err(LiftError::InvalidRequest(_))));
        assert!(matches!(
            decode(r#"{"floor":1}"#),
            Err(LiftError::InvalidRequest(_))
        ));
    }

    #[test]
    fn ping_rejects_idle_direction() {
        assert!(decode(r#"{"type":"ping","floor":1,"direction":"idle"}"#).is_err());
    }

    #[test]
    fn negative_capacity_is_config_error() {
        let err =
            sim_config(&SimConfig::default(), None, None, Some(-2), None, None).unwrap_err();
        assert!(matches!(err, LiftError::Config(_)));
    }

    #[test]
    fn passenger_count_bounds() {
        assert_eq!(passenger_count(3).unwrap(), 3);
        assert!(passenger_count(0).is_err());
        assert!(passenger_count(-4).is_err());
    }

    #[test]
    fn reply_shape() {
        let reply = Reply::from(&LiftError::Unconfigured);
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "simulation is not configured");
    }
}
