//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mailhands_protocols::{EngineError, ErrorKind};
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(e) => match e.kind() {
                ErrorKind::UnsupportedProvider | ErrorKind::UnparsableInstruction => {
                    StatusCode::BAD_REQUEST
                }
                ErrorKind::TaskNotFound => StatusCode::NOT_FOUND,
                ErrorKind::AuthenticationTimeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::NavigationError
                | ErrorKind::SessionCrashed
                | ErrorKind::ProviderBlocked => StatusCode::BAD_GATEWAY,
                ErrorKind::ElementNotFound
                | ErrorKind::FieldMismatch
                | ErrorKind::ActionFailed => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Engine(e) => Some(e.kind()),
            ApiError::InvalidRequest(_) => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}
