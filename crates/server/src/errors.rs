use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ApiResponse;
use service::portal::PortalError;
use thiserror::Error;
use tracing::{debug, error};

use crate::metrics;

/// Failure returned by every portal handler, rendered as the JSON envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON format")]
    InvalidJson(#[from] JsonRejection),
    #[error(transparent)]
    Portal(#[from] PortalError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Portal(e) => match e {
                PortalError::Validation(_) | PortalError::AlreadyResolved => StatusCode::BAD_REQUEST,
                PortalError::Unauthorized => StatusCode::UNAUTHORIZED,
                PortalError::Forbidden(_) => StatusCode::FORBIDDEN,
                PortalError::Conflict => StatusCode::CONFLICT,
                PortalError::NotFound => StatusCode::NOT_FOUND,
                PortalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match &self {
            ApiError::InvalidJson(rejection) => {
                debug!(detail = %rejection.body_text(), "rejected request body");
                self.to_string()
            }
            ApiError::Portal(PortalError::Internal(detail)) => {
                error!(error = %detail, "internal error");
                "Internal server error".to_string()
            }
            ApiError::Portal(e) => {
                if matches!(e, PortalError::Unauthorized) {
                    metrics::AUTH_FAILURES_TOTAL.inc();
                }
                e.to_string()
            }
        };
        (status, Json(ApiResponse::<()>::error(msg))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("admin bootstrap failed: {0}")]
    Bootstrap(String),
}
