use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::altitude::{
    format_timestamp, parse_timestamp, AltitudeSeries, OrbitalElements, Sample, TimeWindow,
};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

const DEFAULT_STEP_SECONDS: i64 = 60;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AltitudeQuery {
    /// NORAD catalog number
    pub n: u32,
    pub start: String,
    pub end: String,
    #[serde(default = "default_step")]
    pub step_seconds: i64,
}

fn default_step() -> i64 {
    DEFAULT_STEP_SECONDS
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AltitudeResponse {
    pub norad_id: u32,
    pub start: String,
    pub end: String,
    pub step_seconds: i64,
    pub points: Vec<Sample>,
    pub meta: AltitudeMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AltitudeMeta {
    pub tle_source: String,
    /// Epoch field as written in the element set
    pub tle_epoch: String,
    pub tle_epoch_utc: String,
    pub earth_radius_km: f64,
}

impl AltitudeResponse {
    pub fn new(series: AltitudeSeries, tle_source: &str) -> Self {
        let meta = &series.metadata;
        AltitudeResponse {
            norad_id: meta.catalog_id,
            start: format_timestamp(&meta.window.start()),
            end: format_timestamp(&meta.window.end()),
            step_seconds: meta.window.step_seconds(),
            meta: AltitudeMeta {
                tle_source: tle_source.to_string(),
                tle_epoch: meta.epoch_text.clone(),
                tle_epoch_utc: meta.epoch.to_rfc3339(),
                earth_radius_km: meta.earth_radius_km,
            },
            points: series.samples,
        }
    }
}

#[utoipa::path(
    get,
    path = "/altitude",
    tag = "altitude",
    params(
        ("n" = u32, Query, description = "NORAD catalog number", minimum = 1),
        ("start" = String, Query, description = "Start time, YYYY-MM-DDTHH:MM:SSZ (UTC)"),
        ("end" = String, Query, description = "End time, YYYY-MM-DDTHH:MM:SSZ (UTC)"),
        ("step_seconds" = Option<i64>, Query, description = "Time step in seconds (1-3600, default 60)")
    ),
    responses(
        (status = 200, description = "Altitude series", body = AltitudeResponse),
        (status = 400, description = "Invalid parameters or too many points", body = ErrorResponse),
        (status = 404, description = "Catalog number not found", body = ErrorResponse),
        (status = 422, description = "Orbit model cannot propagate the element set", body = ErrorResponse),
        (status = 502, description = "Element set unavailable or malformed", body = ErrorResponse)
    )
)]
pub async fn altitude(
    State(state): State<AppState>,
    query: Result<Query<AltitudeQuery>, QueryRejection>,
) -> ApiResult<Json<AltitudeResponse>> {
    let Query(query) = query.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    if query.n == 0 {
        return Err(ApiError::InvalidRequest("n must be at least 1".into()));
    }
    let start = parse_timestamp(&query.start)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid timestamp format: {}", e)))?;
    let end = parse_timestamp(&query.end)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid timestamp format: {}", e)))?;

    // Reject oversized or inverted windows before touching the TLE source.
    let window = TimeWindow::new(start, end, query.step_seconds, &state.config.limits)?;

    let tle = state.source.fetch(query.n)?;
    let elements = OrbitalElements::from_tle(&tle.line1, &tle.line2)?;

    let assembler = state.assembler.clone();
    let series = tokio::task::spawn_blocking(move || assembler.build(&elements, &window))
        .await
        .map_err(|e| ApiError::Internal(format!("Series computation aborted: {}", e)))??;

    log::info!(
        "Computed {} altitude points for NORAD {}",
        series.samples.len(),
        query.n
    );

    Ok(Json(AltitudeResponse::new(
        series,
        &state.config.tle.source_tag,
    )))
}
