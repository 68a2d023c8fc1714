use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::altitude::AltitudeError;
use crate::source::SourceError;

#[derive(Debug)]
pub enum ApiError {
    InvalidRequest(String),
    Altitude(AltitudeError),
    Source(SourceError),
    Internal(String),
}

impl From<AltitudeError> for ApiError {
    fn from(e: AltitudeError) -> Self {
        ApiError::Altitude(e)
    }
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        ApiError::Source(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Altitude(e) => match e {
                AltitudeError::InvalidWindow(_) | AltitudeError::TooManyPoints { .. } => {
                    StatusCode::BAD_REQUEST
                }
                AltitudeError::MalformedElementSet(_) => StatusCode::BAD_GATEWAY,
                AltitudeError::PropagationFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                AltitudeError::DegeneratePosition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Source(SourceError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Source(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::Altitude(e) => e.category(),
            ApiError::Source(SourceError::NotFound(_)) => "not_found",
            ApiError::Source(_) => "tle_source_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidRequest(msg) | ApiError::Internal(msg) => msg.clone(),
            ApiError::Altitude(e) => e.to_string(),
            ApiError::Source(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            log::error!("{} ({}): {}", status, self.category(), message);
        }
        (
            status,
            Json(ErrorResponse::with_message(self.category(), &message)),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    #[test]
    fn status_mapping() {
        let cases: Vec<(ApiError, StatusCode, &str)> = vec![
            (
                ApiError::InvalidRequest("bad".into()),
                StatusCode::BAD_REQUEST,
                "invalid_request",
            ),
            (
                AltitudeError::InvalidWindow("x".into()).into(),
                StatusCode::BAD_REQUEST,
                "invalid_window",
            ),
            (
                AltitudeError::TooManyPoints {
                    requested: 20001,
                    max: 20000,
                }
                .into(),
                StatusCode::BAD_REQUEST,
                "too_many_points",
            ),
            (
                AltitudeError::MalformedElementSet("x".into()).into(),
                StatusCode::BAD_GATEWAY,
                "malformed_element_set",
            ),
            (
                AltitudeError::PropagationFailure {
                    instant: DateTime::<Utc>::UNIX_EPOCH,
                    message: "decayed".into(),
                }
                .into(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "propagation_failure",
            ),
            (
                AltitudeError::DegeneratePosition {
                    instant: DateTime::<Utc>::UNIX_EPOCH,
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "degenerate_position",
            ),
            (
                SourceError::NotFound(7).into(),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                SourceError::Format("x".into()).into(),
                StatusCode::BAD_GATEWAY,
                "tle_source_error",
            ),
            (
                ApiError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];

        for (error, status, category) in cases {
            assert_eq!(error.status(), status, "{:?}", error);
            assert_eq!(error.category(), category);
        }
    }

    #[test]
    fn error_body_omits_missing_message() {
        let body = serde_json::to_string(&ErrorResponse {
            error: "not_found".into(),
            message: None,
        })
        .unwrap();
        assert_eq!(body, r#"{"error":"not_found"}"#);
    }
}
