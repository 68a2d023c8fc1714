use super::error::DegeneratePosition;
use super::propagator::Position;

/// Mean spherical Earth radius, km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Height of `position` above a sphere of `radius_km`.
pub fn altitude_km(position: Position, radius_km: f64) -> Result<f64, DegeneratePosition> {
    if position.iter().any(|c| !c.is_finite()) {
        return Err(DegeneratePosition);
    }
    let distance = geocentric_distance(position);
    if distance == 0.0 || !distance.is_finite() {
        return Err(DegeneratePosition);
    }
    Ok(distance - radius_km)
}

pub fn geocentric_distance(position: Position) -> f64 {
    position.iter().map(|c| c * c).sum::<f64>().sqrt()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
