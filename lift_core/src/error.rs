use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LiftError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("capacity exceeded: car already holds {capacity} passengers")]
    CapacityExceeded { capacity: usize },
    #[error("inconsistent state: {0}")]
    Inconsistency(String),
    #[error("cycle task did not terminate within {0:?}")]
    TaskTerminationTimeout(Duration),
    #[error("simulation is not configured")]
    Unconfigured,
    #[error("invalid state: {0}")]
    State(String),
}

pub type Result<T, E = LiftError> = std::result::Result<T, E>;
