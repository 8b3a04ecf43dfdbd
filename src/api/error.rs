//! JSON error responses

use crate::core::animator::AnimateError;
use crate::core::provider::RequestError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Error returned by the JSON endpoint
#[derive(Debug)]
pub struct ApiError(pub AnimateError);

impl From<AnimateError> for ApiError {
    fn from(error: AnimateError) -> Self {
        Self(error)
    }
}

/// HTTP status for a failed submission
pub fn status_for(error: &AnimateError) -> StatusCode {
    match error {
        AnimateError::MissingInput(_) => StatusCode::BAD_REQUEST,
        AnimateError::Request(RequestError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        AnimateError::Request(_) => StatusCode::BAD_GATEWAY,
        AnimateError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn code_for(error: &AnimateError) -> &'static str {
    match error {
        AnimateError::MissingInput(_) => "missing_input",
        AnimateError::Request(e) => e.code(),
        AnimateError::Validation { error, .. } => error.code(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let code = code_for(&self.0);
        let body = match &self.0 {
            AnimateError::Validation { error, raw } => json!({
                "error": {
                    "code": code,
                    "message": error.to_string(),
                    "raw": raw,
                }
            }),
            other => json!({
                "error": {
                    "code": code,
                    "message": other.to_string(),
                }
            }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::ValidationError;

    #[test]
    fn test_statuses() {
        assert_eq!(
            status_for(&AnimateError::MissingInput("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AnimateError::Request(RequestError::Timeout(5))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&AnimateError::Request(RequestError::Authentication(
                "bad key".to_string()
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&AnimateError::Validation {
                error: ValidationError::NoMarkup,
                raw: String::new(),
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
