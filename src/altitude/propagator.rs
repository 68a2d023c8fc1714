use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use super::elements::OrbitalElements;
use super::error::PropagationError;

/// Earth-centered inertial position, km.
pub type Position = [f64; 3];

/// Maps an element set and an instant to a position.
///
/// Implementations must be deterministic and safe to share between
/// concurrently running requests.
pub trait OrbitPropagator: Send + Sync {
    fn propagate(
        &self,
        elements: &OrbitalElements,
        instant: DateTime<Utc>,
    ) -> Result<Position, PropagationError>;

    /// Binds the propagator to one element set for repeated evaluation.
    /// Backends with per-element-set model state initialize it here once.
    fn prepare<'a>(
        &'a self,
        elements: &'a OrbitalElements,
    ) -> Result<Box<dyn PreparedOrbit + 'a>, PropagationError> {
        Ok(Box::new(PerInstant {
            propagator: self,
            elements,
        }))
    }
}

/// An element set with its model state initialized.
pub trait PreparedOrbit {
    fn position_at(&self, instant: DateTime<Utc>) -> Result<Position, PropagationError>;
}

struct PerInstant<'a, P: ?Sized> {
    propagator: &'a P,
    elements: &'a OrbitalElements,
}

impl<P: OrbitPropagator + ?Sized> PreparedOrbit for PerInstant<'_, P> {
    fn position_at(&self, instant: DateTime<Utc>) -> Result<Position, PropagationError> {
        self.propagator.propagate(self.elements, instant)
    }
}

/// SGP4/SDP4 propagation backed by the `sgp4` crate. The output frame is TEME.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Propagator;

impl Sgp4Propagator {
    pub fn new() -> Self {
        Self
    }
}

impl OrbitPropagator for Sgp4Propagator {
    fn propagate(
        &self,
        elements: &OrbitalElements,
        instant: DateTime<Utc>,
    ) -> Result<Position, PropagationError> {
        Sgp4Orbit::new(elements)?.position_at(instant)
    }

    fn prepare<'a>(
        &'a self,
        elements: &'a OrbitalElements,
    ) -> Result<Box<dyn PreparedOrbit + 'a>, PropagationError> {
        Ok(Box::new(Sgp4Orbit::new(elements)?))
    }
}

/// Decoded `sgp4` elements with their model constants, built once per
/// element set.
pub struct Sgp4Orbit {
    elements: Elements,
    constants: Constants,
}

impl Sgp4Orbit {
    pub fn new(elements: &OrbitalElements) -> Result<Self, PropagationError> {
        let elements = elements
            .sgp4_elements()
            .map_err(|e| PropagationError(e.to_string()))?;
        let constants =
            Constants::from_elements(&elements).map_err(|e| PropagationError(e.to_string()))?;
        Ok(Self {
            elements,
            constants,
        })
    }
}

impl PreparedOrbit for Sgp4Orbit {
    fn position_at(&self, instant: DateTime<Utc>) -> Result<Position, PropagationError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&instant.naive_utc())
            .map_err(|e| PropagationError(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PropagationError(e.to_string()))?;

        Ok(prediction.position)
    }
}
