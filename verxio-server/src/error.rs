//! Error types for the checkout service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use verxio::error::EarnPoolError;

/// Errors that can occur while serving checkout requests.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body did not match the expected shape.
    #[error("Invalid payload")]
    InvalidPayload,

    /// The earn pool rejected or failed the operation.
    #[error("{0}")]
    Pool(#[from] EarnPoolError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidPayload => StatusCode::BAD_REQUEST,
            Self::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "success": false, "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
