// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from engine errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use turnos_core::TurnosError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable kind, e.g. `invalid_transition`.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

/// A failed API request.
#[derive(Debug)]
pub enum ApiError {
    /// The actor headers are missing or malformed.
    Unauthenticated(String),
    /// The engine rejected the operation.
    Engine(TurnosError),
}

impl From<TurnosError> for ApiError {
    fn from(err: TurnosError) -> Self {
        ApiError::Engine(err)
    }
}

/// Status code for an engine error.
pub fn status_for(err: &TurnosError) -> StatusCode {
    if err.is_transient() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match err {
        TurnosError::NotFound { .. } => StatusCode::NOT_FOUND,
        TurnosError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        TurnosError::AlreadyTerminal { .. }
        | TurnosError::InvalidTransition { .. }
        | TurnosError::SequenceExhausted { .. } => StatusCode::CONFLICT,
        TurnosError::InvalidScope { .. }
        | TurnosError::TurnInPast { .. }
        | TurnosError::OutsideServiceHours { .. }
        | TurnosError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthenticated(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "unauthenticated".to_string(),
                    message,
                },
            ),
            ApiError::Engine(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::warn!(kind = err.kind(), error = %err, "request failed");
                }
                (
                    status,
                    ErrorResponse {
                        error: err.kind().to_string(),
                        message: err.to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
