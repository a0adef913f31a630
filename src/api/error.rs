//! Mapping of pipeline errors onto HTTP responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::DetectorError;

/// Error body, `{ "detail": "..." }`
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// An error ready to be sent to the client
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<DetectorError> for ApiError {
    fn from(err: DetectorError) -> Self {
        let status = match &err {
            DetectorError::NotFound(_) => StatusCode::NOT_FOUND,
            DetectorError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Analysis failed: {}", err);
        } else {
            warn!("Rejected request: {}", err);
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (DetectorError::NotFound("File not found: x.png".into()), StatusCode::NOT_FOUND),
            (DetectorError::PathEscape("../x".into()), StatusCode::BAD_REQUEST),
            (DetectorError::ocr("gone"), StatusCode::INTERNAL_SERVER_ERROR),
            (DetectorError::Timeout { seconds: 3 }, StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }

        let source = regex::Regex::new("[").unwrap_err();
        let pattern = ApiError::from(DetectorError::Pattern { pattern: "[".into(), source });
        assert_eq!(pattern.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_message_survives() {
        let api = ApiError::from(DetectorError::NotFound("File not found: x.png".into()));
        assert_eq!(api.message, "File not found: x.png");
    }
}
