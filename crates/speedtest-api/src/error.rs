//! One error type for every handler.
//!
//! Validation-style failures answer `{"detail": ...}`, size and timeout
//! policy failures answer `{"error": ...}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use speedtest_core::UploadError;
use speedtest_services::{CardError, ShareStoreError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Upload too large")]
    PayloadTooLarge,
    #[error("Upload stalled")]
    RequestTimeout,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::PayloadTooLarge | ApiError::RequestTimeout => {
                json!({ "error": self.to_string() })
            }
            ApiError::Internal(e) => {
                tracing::error!(error = format!("{e:#}"), "request failed");
                json!({ "detail": "Internal server error" })
            }
            _ => json!({ "detail": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::TooLarge {
                received,
                limit,
                drained,
            } => {
                tracing::warn!(received, limit, drained, "upload rejected: too large");
                ApiError::PayloadTooLarge
            }
            UploadError::Stalled(idle) => {
                tracing::warn!(?idle, "upload abandoned: body stalled");
                ApiError::RequestTimeout
            }
            UploadError::Transport { received, source } => {
                tracing::debug!(received, error = %source, "upload body read failed");
                ApiError::BadRequest("Upload body could not be read".to_string())
            }
        }
    }
}

impl From<ShareStoreError> for ApiError {
    fn from(e: ShareStoreError) -> Self {
        ApiError::Internal(e.into())
    }
}

impl From<CardError> for ApiError {
    fn from(e: CardError) -> Self {
        ApiError::Validation(e.to_string())
    }
}
