mod deriver;
mod elements;
mod error;
mod grid;
mod propagator;
mod series;

pub use elements::OrbitalElements;
pub use error::{AltitudeError, PropagationError};
pub use grid::{GridLimits, TimeWindow};
pub use propagator::{OrbitPropagator, Position, Sgp4Propagator};
pub use series::{format_timestamp, parse_timestamp, AltitudeSeries, Sample, SeriesAssembler};
