//! JSON error responses shared by the API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use convertino_core::{ClientError, ConvertError};
use serde::Serialize;

use crate::files::OutsideRoot;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
                kind: self.kind,
            }),
        )
            .into_response()
    }
}

impl From<ConvertError> for ApiError {
    fn from(err: ConvertError) -> Self {
        let status = match &err {
            ConvertError::SourceNotFound { .. } => StatusCode::NOT_FOUND,
            ConvertError::InvalidFormat { .. } | ConvertError::InvalidTargetDirectory { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ConvertError::ConversionFailed { .. } | ConvertError::CreateFileFromStream { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ConvertError::Cache(_) | ConvertError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

impl From<OutsideRoot> for ApiError {
    fn from(err: OutsideRoot) -> Self {
        Self::new(StatusCode::FORBIDDEN, "path_outside_root", err.to_string())
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        let kind = match &err {
            ClientError::AuthenticationFailed(_) => "authentication_failed",
            ClientError::Timeout => "timeout",
            ClientError::Configuration(_) => "configuration",
            _ => "backend",
        };
        Self::new(StatusCode::BAD_GATEWAY, kind, err.to_string())
    }
}
