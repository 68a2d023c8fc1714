use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use utoipa::ToSchema;

use super::deriver::{altitude_km, round2, EARTH_RADIUS_KM};
use super::elements::OrbitalElements;
use super::error::AltitudeError;
use super::grid::TimeWindow;
use super::propagator::OrbitPropagator;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One altitude reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Sample {
    #[serde(rename = "t", serialize_with = "serialize_timestamp")]
    #[schema(value_type = String, example = "2024-01-01T12:00:00Z")]
    pub instant: DateTime<Utc>,
    /// Altitude above the reference sphere, rounded to 2 decimals.
    #[serde(rename = "alt_km", serialize_with = "serialize_rounded")]
    #[schema(example = 421.37)]
    pub altitude_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesMetadata {
    pub catalog_id: u32,
    pub window: TimeWindow,
    pub epoch: DateTime<Utc>,
    pub epoch_text: String,
    pub earth_radius_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AltitudeSeries {
    pub samples: Vec<Sample>,
    pub metadata: SeriesMetadata,
}

/// Drives propagation over a time grid.
#[derive(Clone)]
pub struct SeriesAssembler {
    propagator: Arc<dyn OrbitPropagator>,
    earth_radius_km: f64,
}

impl SeriesAssembler {
    pub fn new(propagator: Arc<dyn OrbitPropagator>) -> Self {
        Self {
            propagator,
            earth_radius_km: EARTH_RADIUS_KM,
        }
    }

    /// Computes the whole series or nothing: the first failed sample aborts.
    pub fn build(
        &self,
        elements: &OrbitalElements,
        window: &TimeWindow,
    ) -> Result<AltitudeSeries, AltitudeError> {
        let grid = window.grid();
        log::debug!(
            "Building series for {}: {} .. {} every {}s ({} points)",
            elements.catalog_id,
            window.start(),
            window.end(),
            window.step_seconds(),
            grid.point_count()
        );

        // Model initialization failures are reported against the first instant.
        let orbit = self.propagator.prepare(elements).map_err(|e| {
            AltitudeError::PropagationFailure {
                instant: window.start(),
                message: e.to_string(),
            }
        })?;

        let mut samples = Vec::with_capacity(grid.point_count());
        for instant in grid.iter() {
            let position = orbit
                .position_at(instant)
                .map_err(|e| AltitudeError::PropagationFailure {
                    instant,
                    message: e.to_string(),
                })?;

            let altitude_km = altitude_km(position, self.earth_radius_km)
                .map_err(|_| AltitudeError::DegeneratePosition { instant })?;

            samples.push(Sample {
                instant,
                altitude_km,
            });
        }

        Ok(AltitudeSeries {
            samples,
            metadata: SeriesMetadata {
                catalog_id: elements.catalog_id,
                window: *window,
                epoch: elements.epoch,
                epoch_text: elements.epoch_text.clone(),
                earth_radius_km: self.earth_radius_km,
            },
        })
    }
}

pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses `YYYY-MM-DDTHH:MM:SSZ` and nothing else: no offsets, no fractional
/// seconds, no unpadded fields.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    const SHAPE: &[u8; 20] = b"0000-00-00T00:00:00Z";
    let bytes = s.as_bytes();
    let matches_shape = bytes.len() == SHAPE.len()
        && bytes.iter().zip(SHAPE).all(|(b, expected)| match *expected {
            b'0' => b.is_ascii_digit(),
            _ => b == expected,
        });
    if !matches_shape {
        return Err(format!("'{}' is not of the form YYYY-MM-DDTHH:MM:SSZ", s));
    }
    let instant = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| format!("'{}': {}", s, e))?;
    // chrono reads second 60 as a leap second on any minute
    if instant.nanosecond() >= 1_000_000_000 {
        return Err(format!("'{}': second out of range", s));
    }
    Ok(instant)
}

fn serialize_timestamp<S: Serializer>(instant: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(instant))
}

fn serialize_rounded<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round2(*value))
}
