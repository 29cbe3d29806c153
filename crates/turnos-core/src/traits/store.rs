// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn record store trait for persistence backends (SQLite, in-memory).

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::error::TurnosError;
use crate::traits::adapter::Adapter;
use crate::turn::{NewTurn, Scope, Turn, TurnFilter};
use crate::types::{TurnId, TurnState};

/// Durable storage of turn records.
///
/// Every mutation touches a single turn or a single allocation scope.
/// Readers must never observe a partially written turn.
#[async_trait]
pub trait TurnStore: Adapter {
    /// Highest sequence already used in `scope`, or 0 when the scope is empty.
    ///
    /// Cancelled and attended turns count, so numbers are never reused.
    async fn max_sequence(&self, scope: &Scope) -> Result<u32, TurnosError>;

    /// Insert a turn if its number is unused in its scope.
    ///
    /// Returns [`TurnosError::Conflict`] when another turn already holds the
    /// same `(service_point, date, priority, number)` tuple.
    async fn insert_turn(&self, turn: &NewTurn) -> Result<Turn, TurnosError>;

    /// Fetch a turn by id.
    async fn get_turn(&self, id: TurnId) -> Result<Option<Turn>, TurnosError>;

    /// List turns matching `filter`, ordered by scope then sequence.
    async fn query_turns(&self, filter: &TurnFilter) -> Result<Vec<Turn>, TurnosError>;

    /// Move a turn from `expected` to `new_state` atomically.
    ///
    /// `attended_at` is written only when it is `Some`. Returns
    /// [`TurnosError::Conflict`] if the stored state is no longer `expected`,
    /// and [`TurnosError::NotFound`] if the turn does not exist.
    async fn update_state(
        &self,
        id: TurnId,
        expected: TurnState,
        new_state: TurnState,
        attended_at: Option<DateTime<FixedOffset>>,
    ) -> Result<Turn, TurnosError>;
}
