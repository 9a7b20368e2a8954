use axum::{
    http::{header::CACHE_CONTROL, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::PayloadError;
use thiserror::Error;

use crate::services::UpstreamError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

impl ApiError {
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::Upstream(err) => err.outcome(),
            ApiError::Payload(PayloadError::Malformed(_)) => "malformed",
            ApiError::Payload(PayloadError::InvalidShape(_)) => "invalid_shape",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (
            StatusCode::BAD_GATEWAY,
            [(CACHE_CONTROL, "no-store")],
            Json(body),
        )
            .into_response()
    }
}
