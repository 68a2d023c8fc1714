use utoipa::OpenApi;

use super::api::altitude::{AltitudeMeta, AltitudeResponse};
use super::api::error::ErrorResponse;
use super::api::health::HealthResponse;
use crate::altitude::Sample;

#[derive(OpenApi)]
#[openapi(
    paths(super::api::altitude::altitude, super::api::health::health),
    components(schemas(AltitudeResponse, AltitudeMeta, Sample, ErrorResponse, HealthResponse)),
    info(
        title = "Satellite Altitude API",
        description = "Altitude time series computed from two-line element sets with SGP4",
        version = "0.1.0"
    ),
    tags(
        (name = "altitude", description = "Altitude series"),
        (name = "service", description = "Service status")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_both_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/altitude"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
