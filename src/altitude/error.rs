use chrono::{DateTime, Utc};
use strum_macros::IntoStaticStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AltitudeError {
    #[error("Malformed element set: {0}")]
    MalformedElementSet(String),
    #[error("Invalid window: {0}")]
    InvalidWindow(String),
    #[error(
        "Too many data points ({requested}). Maximum allowed is {max}. \
         Please increase step_seconds or reduce time range."
    )]
    TooManyPoints { requested: u64, max: usize },
    #[error("Propagation failed at {instant}: {message}")]
    PropagationFailure {
        instant: DateTime<Utc>,
        message: String,
    },
    #[error("Propagator returned a degenerate position at {instant}")]
    DegeneratePosition { instant: DateTime<Utc> },
}

impl AltitudeError {
    pub fn category(&self) -> &'static str {
        self.into()
    }
}

/// Failure reported by an [`OrbitPropagator`](super::OrbitPropagator).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct PropagationError(pub String);

/// The deriver was handed a zero-length or non-finite position vector.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("degenerate position vector")]
pub struct DegeneratePosition;
