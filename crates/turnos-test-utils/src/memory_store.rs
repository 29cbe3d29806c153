// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store for deterministic testing.
//!
//! `MemoryStore` implements both `TurnStore` and `ServicePointRegistry`.
//! Inserts enforce the same per-scope uniqueness rule as the SQLite schema,
//! and conflicts can be injected to exercise the allocator's retry path.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tokio::sync::Mutex;

use turnos_core::{
    Adapter, HealthStatus, NewTurn, Scope, ServicePoint, ServicePointId, ServicePointRegistry,
    Turn, TurnFilter, TurnId, TurnState, TurnStore, TurnosError,
};

#[derive(Default)]
struct Inner {
    turns: Vec<Turn>,
    points: BTreeMap<ServicePointId, ServicePoint>,
    next_id: i64,
    forced_conflicts: u32,
    insert_attempts: u32,
}

/// A turn store and service point registry held in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given service points registered.
    pub fn with_points(points: impl IntoIterator<Item = ServicePoint>) -> Self {
        let inner = Inner {
            points: points.into_iter().map(|p| (p.id, p)).collect(),
            ..Inner::default()
        };
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Register or replace a service point.
    pub async fn put_service_point(&self, point: ServicePoint) {
        self.inner.lock().await.points.insert(point.id, point);
    }

    /// Make the next `n` inserts fail with `Conflict` regardless of content.
    pub async fn force_conflicts(&self, n: u32) {
        self.inner.lock().await.forced_conflicts = n;
    }

    /// Every insert attempted so far, including rejected ones.
    pub async fn insert_attempts(&self) -> u32 {
        self.inner.lock().await.insert_attempts
    }

    /// Snapshot of all stored turns in insertion order.
    pub async fn all_turns(&self) -> Vec<Turn> {
        self.inner.lock().await.turns.clone()
    }
}

#[async_trait]
impl Adapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, TurnosError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TurnosError> {
        Ok(())
    }
}

#[async_trait]
impl TurnStore for MemoryStore {
    async fn max_sequence(&self, scope: &Scope) -> Result<u32, TurnosError> {
        let max = self
            .inner
            .lock()
            .await
            .turns
            .iter()
            .filter(|t| t.scope() == *scope)
            .map(|t| t.number.sequence)
            .max()
            .unwrap_or(0);
        // Widen the window between read and insert so racing allocators
        // actually collide.
        tokio::task::yield_now().await;
        Ok(max)
    }

    async fn insert_turn(&self, turn: &NewTurn) -> Result<Turn, TurnosError> {
        let mut inner = self.inner.lock().await;
        inner.insert_attempts += 1;

        let scope = turn.scope();
        if inner.forced_conflicts > 0 {
            inner.forced_conflicts -= 1;
            return Err(TurnosError::Conflict {
                scope: scope.to_string(),
            });
        }
        if inner
            .turns
            .iter()
            .any(|t| t.scope() == scope && t.number == turn.number)
        {
            return Err(TurnosError::Conflict {
                scope: scope.to_string(),
            });
        }

        inner.next_id += 1;
        let stored = turn.clone().into_turn(TurnId(inner.next_id));
        inner.turns.push(stored.clone());
        Ok(stored)
    }

    async fn get_turn(&self, id: TurnId) -> Result<Option<Turn>, TurnosError> {
        Ok(self
            .inner
            .lock()
            .await
            .turns
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn query_turns(&self, filter: &TurnFilter) -> Result<Vec<Turn>, TurnosError> {
        let mut turns: Vec<Turn> = self
            .inner
            .lock()
            .await
            .turns
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        turns.sort_by_key(|t| {
            (
                t.date,
                t.service_point_ref,
                t.priority_class.prefix(),
                t.number.sequence,
                t.id,
            )
        });
        Ok(turns)
    }

    async fn update_state(
        &self,
        id: TurnId,
        expected: TurnState,
        new_state: TurnState,
        attended_at: Option<DateTime<FixedOffset>>,
    ) -> Result<Turn, TurnosError> {
        let mut inner = self.inner.lock().await;
        let turn = inner
            .turns
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TurnosError::missing_turn(id))?;
        if turn.state != expected {
            return Err(TurnosError::Conflict {
                scope: format!("turn {id} is no longer {expected}"),
            });
        }
        turn.state = new_state;
        if turn.attended_timestamp.is_none() {
            turn.attended_timestamp = attended_at;
        }
        Ok(turn.clone())
    }
}

#[async_trait]
impl ServicePointRegistry for MemoryStore {
    async fn get_service_point(
        &self,
        id: ServicePointId,
    ) -> Result<Option<ServicePoint>, TurnosError> {
        Ok(self.inner.lock().await.points.get(&id).cloned())
    }

    async fn list_service_points(&self) -> Result<Vec<ServicePoint>, TurnosError> {
        Ok(self.inner.lock().await.points.values().cloned().collect())
    }
}
