// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Turnos queue system.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{ServicePointId, TurnId, TurnState};

/// The primary error type used across the allocator, ordering engine,
/// state machine, and every collaborator adapter.
///
/// Each rejected operation maps to its own variant so callers can tell
/// the reasons apart without parsing messages.
#[derive(Debug, Error)]
pub enum TurnosError {
    /// The target service point is unknown or inactive.
    #[error("invalid scope: service point {service_point} is {reason}")]
    InvalidScope {
        service_point: ServicePointId,
        reason: String,
    },

    /// A concurrent allocation claimed the same number in the same scope.
    ///
    /// Raised by stores on a uniqueness violation. The allocator retries it.
    #[error("allocation conflict in scope {scope}")]
    Conflict { scope: String },

    /// The allocator gave up after repeated conflicts in one scope.
    #[error("allocation in scope {scope} still conflicting after {attempts} attempts")]
    AllocationRetriesExhausted { scope: String, attempts: u32 },

    /// The per-scope sequence cap was reached.
    #[error("scope {scope} reached its sequence limit of {limit}")]
    SequenceExhausted { scope: String, limit: u32 },

    /// The turn's day is before the current local date.
    #[error("turn date {date} is before today ({today})")]
    TurnInPast { date: NaiveDate, today: NaiveDate },

    /// The turn is Attended or Cancelled and cannot change any more.
    #[error("turn {turn_id} is already {state}")]
    AlreadyTerminal { turn_id: TurnId, state: TurnState },

    /// The requested change is not an edge of the state machine.
    #[error("turn {turn_id} cannot move from {from} to {to}")]
    InvalidTransition {
        turn_id: TurnId,
        from: TurnState,
        to: TurnState,
    },

    /// The actor lacks rights over the target service point or turn.
    #[error("permission denied: {actor} may not {action}")]
    PermissionDenied { actor: String, action: String },

    /// A referenced turn or service point does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Creation attempted outside every configured appointment window.
    #[error("requests are not accepted at {hour:02}:00 local time")]
    OutsideServiceHours { hour: u32 },

    /// Malformed input (bad number code, empty requester, etc.).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TurnosError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TurnosError::Conflict { .. }
                | TurnosError::AllocationRetriesExhausted { .. }
                | TurnosError::Storage { .. }
        )
    }

    /// Short machine-readable kind, used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TurnosError::InvalidScope { .. } => "invalid_scope",
            TurnosError::Conflict { .. } => "conflict",
            TurnosError::AllocationRetriesExhausted { .. } => "allocation_retries_exhausted",
            TurnosError::SequenceExhausted { .. } => "sequence_exhausted",
            TurnosError::TurnInPast { .. } => "turn_in_past",
            TurnosError::AlreadyTerminal { .. } => "already_terminal",
            TurnosError::InvalidTransition { .. } => "invalid_transition",
            TurnosError::PermissionDenied { .. } => "permission_denied",
            TurnosError::NotFound { .. } => "not_found",
            TurnosError::OutsideServiceHours { .. } => "outside_service_hours",
            TurnosError::Validation(_) => "validation",
            TurnosError::Config(_) => "config",
            TurnosError::Storage { .. } => "storage",
            TurnosError::Internal(_) => "internal",
        }
    }

    /// Not-found error for a turn id.
    pub fn missing_turn(id: TurnId) -> Self {
        TurnosError::NotFound {
            entity: "turn",
            id: id.to_string(),
        }
    }

    /// Not-found error for a service point id.
    pub fn missing_service_point(id: ServicePointId) -> Self {
        TurnosError::NotFound {
            entity: "service point",
            id: id.to_string(),
        }
    }
}
