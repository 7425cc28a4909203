//! Error responses.
//!
//! Every failed request answers with `{"error": "<kind>", "message": "..."}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ds_game::game::{ErrorKind, GameError};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Failure of an API handler
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Game(#[from] GameError),

    /// Body, path or query could not be parsed
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Game(e) => match e.kind() {
                ErrorKind::Configuration
                | ErrorKind::TurnViolation
                | ErrorKind::InputRange
                | ErrorKind::EmptyUndo => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            },
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Game(e) => e.kind().code(),
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::Timeout(_) => "timeout",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Game(e) => {
                if status.is_server_error() {
                    tracing::error!(error = %e, "Storage failure while handling request");
                }
                e.client_message()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
