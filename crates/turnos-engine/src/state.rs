// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn state machine.
//!
//! ```text
//! Waiting -> InProgress -> Attended
//!    |           |
//!    +-----------+-> Cancelled
//! ```
//!
//! `Attended` and `Cancelled` are terminal. Asking for `Attended` again on an
//! attended turn is accepted as a no-op.

use chrono::NaiveDate;
use turnos_core::{Actor, ServicePoint, Turn, TurnState, TurnosError};

/// What a valid transition request should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Write the new state. `stamp_attended` is set when entering `Attended`.
    Apply { stamp_attended: bool },
    /// Already in the requested state; leave the record untouched.
    Unchanged,
}

/// Check that `to` is reachable from the turn's current state.
pub fn plan_transition(turn: &Turn, to: TurnState) -> Result<TransitionPlan, TurnosError> {
    use TurnState::*;

    match (turn.state, to) {
        (Attended, Attended) => Ok(TransitionPlan::Unchanged),
        (Attended | Cancelled, _) => Err(TurnosError::AlreadyTerminal {
            turn_id: turn.id,
            state: turn.state,
        }),
        (Waiting, InProgress) | (Waiting, Cancelled) | (InProgress, Cancelled) => {
            Ok(TransitionPlan::Apply {
                stamp_attended: false,
            })
        }
        (InProgress, Attended) => Ok(TransitionPlan::Apply {
            stamp_attended: true,
        }),
        (from, to) => Err(TurnosError::InvalidTransition {
            turn_id: turn.id,
            from,
            to,
        }),
    }
}

/// Reject cancelling a turn whose day is already over.
pub fn check_not_past(turn: &Turn, today: NaiveDate) -> Result<(), TurnosError> {
    if turn.date < today {
        return Err(TurnosError::TurnInPast {
            date: turn.date,
            today,
        });
    }
    Ok(())
}

/// Check that `actor` may move `turn` into `to`.
///
/// Staff assigned to the point and administrators may apply any
/// transition; the requester may additionally cancel their own turn.
pub fn authorize(
    actor: &Actor,
    turn: &Turn,
    point: &ServicePoint,
    to: TurnState,
) -> Result<(), TurnosError> {
    if actor.manages(point) {
        return Ok(());
    }
    if to == TurnState::Cancelled && actor.id == turn.requester_ref {
        return Ok(());
    }
    Err(TurnosError::PermissionDenied {
        actor: actor.to_string(),
        action: format!("move turn {} to {to}", turn.number),
    })
}
