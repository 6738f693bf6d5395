//! HTTP error mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lexgraph_core::Error;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// No actor identity on the request
    Unauthorized,
    Core(Error),
}

impl From<Error> for AppError {
    fn from(value: Error) -> Self {
        Self::Core(value)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Core(e) => match e {
                Error::NotFound { .. } => StatusCode::NOT_FOUND,
                Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
                Error::ValidationError(_) => StatusCode::BAD_REQUEST,
                Error::ExtractionFailed(_) | Error::NetworkError(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            Self::Unauthorized => ("E101", "Missing x-user-id header".to_string()),
            Self::Core(e) => (e.code(), e.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(code = code, error = %message, "Request failed");
        } else {
            tracing::debug!(code = code, status = %status, error = %message, "Request rejected");
        }

        let body = json!({ "error": { "code": code, "message": message } });
        (status, Json(body)).into_response()
    }
}
