// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket number allocation.
//!
//! Numbers are derived from the rows already in the store: the next
//! sequence is the scope's current maximum plus one. There is no separate
//! counter, so a number is only consumed once its turn is persisted.
//!
//! Within one process, callers on the same scope queue behind a per-scope
//! lock held from reading the maximum until the insert lands, so they never
//! compute the same candidate. Writers in other processes are caught by the
//! store's uniqueness check; the loser re-reads the maximum and tries again.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use turnos_config::model::AllocatorConfig;
use turnos_core::{
    NewTurn, PriorityClass, Scope, ServicePoint, Turn, TurnNumber, TurnStore, TurnosError, UserRef,
};

use crate::recording;

/// Everything needed to persist a turn except its number.
#[derive(Debug, Clone)]
pub struct TurnDraft {
    pub requester: UserRef,
    pub priority: PriorityClass,
    pub appointment_type: String,
    pub date: NaiveDate,
    pub request_timestamp: DateTime<FixedOffset>,
    pub description: Option<String>,
}

/// Assigns collision-free ticket numbers per (service point, date, priority).
pub struct Allocator {
    store: Arc<dyn TurnStore>,
    max_attempts: u32,
    sequence_limit: Option<u32>,
    /// Per-scope critical sections. Idle entries are dropped on each
    /// allocation.
    scope_locks: DashMap<Scope, Arc<Mutex<()>>>,
}

impl Allocator {
    pub fn new(store: Arc<dyn TurnStore>, config: &AllocatorConfig) -> Self {
        Self {
            store,
            max_attempts: config.max_attempts.max(1),
            sequence_limit: config.sequence_limit(),
            scope_locks: DashMap::new(),
        }
    }

    /// The lock serializing allocations in `scope`.
    fn scope_lock(&self, scope: &Scope) -> Arc<Mutex<()>> {
        // Only the map holds an idle lock; nobody can be waiting on it.
        self.scope_locks
            .retain(|held, lock| held == scope || Arc::strong_count(lock) > 1);
        Arc::clone(&self.scope_locks.entry(*scope).or_default())
    }

    /// The number the next allocation in `scope` would receive.
    ///
    /// Read-only; another caller may claim it first.
    pub async fn peek(&self, scope: &Scope) -> Result<TurnNumber, TurnosError> {
        let max = self.store.max_sequence(scope).await?;
        let sequence = next_sequence(scope, max, self.sequence_limit)?;
        Ok(TurnNumber::new(scope.priority, sequence))
    }

    /// Allocate a number at `point` and persist the turn in one step.
    ///
    /// Conflicts are retried up to the configured attempt count, after which
    /// the failure surfaces as [`TurnosError::AllocationRetriesExhausted`].
    pub async fn allocate(&self, point: &ServicePoint, draft: TurnDraft) -> Result<Turn, TurnosError> {
        if !point.active {
            return Err(TurnosError::InvalidScope {
                service_point: point.id,
                reason: "inactive".to_string(),
            });
        }

        let scope = Scope {
            service_point: point.id,
            date: draft.date,
            priority: draft.priority,
        };

        let lock = self.scope_lock(&scope);
        let _guard = lock.lock().await;

        for attempt in 1..=self.max_attempts {
            let number = self.peek(&scope).await?;
            let candidate = NewTurn {
                number,
                service_point_ref: point.id,
                requester_ref: draft.requester.clone(),
                appointment_type: draft.appointment_type.clone(),
                date: draft.date,
                request_timestamp: draft.request_timestamp,
                description: draft.description.clone(),
            };

            match self.store.insert_turn(&candidate).await {
                Ok(turn) => {
                    recording::record_allocation(scope.priority);
                    info!(
                        service_point = %scope.service_point,
                        date = %scope.date,
                        priority = %scope.priority,
                        number = %turn.number,
                        turn_id = %turn.id,
                        attempt,
                        "turn number allocated"
                    );
                    return Ok(turn);
                }
                Err(TurnosError::Conflict { .. }) => {
                    recording::record_conflict();
                    warn!(
                        scope = %scope,
                        number = %number,
                        attempt,
                        max_attempts = self.max_attempts,
                        "allocation conflict, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        debug!(scope = %scope, "allocation retries exhausted");
        Err(TurnosError::AllocationRetriesExhausted {
            scope: scope.to_string(),
            attempts: self.max_attempts,
        })
    }
}

/// `max + 1`, checked against the optional per-scope cap.
pub fn next_sequence(scope: &Scope, max: u32, limit: Option<u32>) -> Result<u32, TurnosError> {
    let exhausted = |limit| TurnosError::SequenceExhausted {
        scope: scope.to_string(),
        limit,
    };
    let next = max.checked_add(1).ok_or_else(|| exhausted(u32::MAX))?;
    match limit {
        Some(limit) if next > limit => Err(exhausted(limit)),
        _ => Ok(next),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnos_core::ServicePointId;

    fn scope() -> Scope {
        Scope {
            service_point: ServicePointId(1),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            priority: PriorityClass::Normal,
        }
    }

    #[test]
    fn empty_scope_starts_at_one() {
        assert_eq!(next_sequence(&scope(), 0, None).unwrap(), 1);
    }

    #[test]
    fn unbounded_scope_grows_past_999() {
        let next = next_sequence(&scope(), 999, None).unwrap();
        assert_eq!(
            TurnNumber::new(PriorityClass::Normal, next).to_string(),
            "N1000"
        );
    }

    #[test]
    fn capped_scope_fails_closed() {
        assert_eq!(next_sequence(&scope(), 998, Some(999)).unwrap(), 999);
        let err = next_sequence(&scope(), 999, Some(999)).unwrap_err();
        assert!(matches!(err, TurnosError::SequenceExhausted { limit: 999, .. }));
    }

    #[test]
    fn u32_overflow_is_exhaustion() {
        assert!(next_sequence(&scope(), u32::MAX, None).is_err());
    }

    mod with_store {
        use super::*;
        use tracing_test::traced_test;
        use turnos_test_utils::{MemoryStore, sample_points};

        fn draft() -> TurnDraft {
            TurnDraft {
                requester: UserRef::new("citizen-1"),
                priority: PriorityClass::Normal,
                appointment_type: "general".into(),
                date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                request_timestamp: DateTime::parse_from_rfc3339("2026-03-02T09:00:00-05:00")
                    .unwrap(),
                description: None,
            }
        }

        fn allocator(store: &Arc<MemoryStore>, max_attempts: u32) -> Allocator {
            let config = AllocatorConfig {
                max_attempts,
                ..AllocatorConfig::default()
            };
            Allocator::new(store.clone(), &config)
        }

        #[tokio::test]
        #[traced_test]
        async fn conflicts_are_retried_and_logged() {
            let store = Arc::new(MemoryStore::new());
            store.force_conflicts(2).await;
            let points = sample_points();
            let point = &points[0];

            let turn = allocator(&store, 3).allocate(point, draft()).await.unwrap();
            assert_eq!(turn.number.to_string(), "N001");
            assert_eq!(store.insert_attempts().await, 3);
            assert!(logs_contain("allocation conflict, retrying"));
        }

        #[tokio::test]
        async fn persistent_conflicts_exhaust_retries() {
            let store = Arc::new(MemoryStore::new());
            store.force_conflicts(10).await;
            let points = sample_points();
            let point = &points[0];

            let err = allocator(&store, 4)
                .allocate(point, draft())
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                TurnosError::AllocationRetriesExhausted { attempts: 4, .. }
            ));
            assert!(err.is_transient());
            assert!(store.all_turns().await.is_empty());
        }

        #[tokio::test]
        async fn inactive_point_is_invalid_scope() {
            let store = Arc::new(MemoryStore::new());
            let points = sample_points();
            let inactive = &points[2];
            let err = allocator(&store, 1)
                .allocate(inactive, draft())
                .await
                .unwrap_err();
            assert!(matches!(err, TurnosError::InvalidScope { .. }));
            assert_eq!(store.insert_attempts().await, 0);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
        async fn same_scope_callers_never_collide_in_process() {
            const CALLERS: usize = 24;
            let store = Arc::new(MemoryStore::new());
            let alloc = Arc::new(allocator(&store, 1));
            let points = sample_points();

            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    let alloc = Arc::clone(&alloc);
                    let point = points[0].clone();
                    tokio::spawn(async move { alloc.allocate(&point, draft()).await })
                })
                .collect();

            let mut sequences = Vec::new();
            for result in futures::future::join_all(handles).await {
                sequences.push(result.unwrap().unwrap().number.sequence);
            }
            sequences.sort_unstable();
            assert_eq!(sequences, (1..=CALLERS as u32).collect::<Vec<_>>());
            assert_eq!(store.insert_attempts().await, CALLERS as u32);
        }

        #[tokio::test]
        async fn idle_scope_locks_are_pruned() {
            let store = Arc::new(MemoryStore::new());
            let alloc = allocator(&store, 1);
            let points = sample_points();

            for day in 2..=6 {
                let mut request = draft();
                request.date = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
                alloc.allocate(&points[0], request).await.unwrap();
            }
            assert_eq!(alloc.scope_locks.len(), 1);
        }

        #[tokio::test]
        async fn peek_does_not_consume() {
            let store = Arc::new(MemoryStore::new());
            let alloc = allocator(&store, 1);
            let scope = Scope {
                service_point: sample_points()[0].id,
                date: draft().date,
                priority: PriorityClass::Normal,
            };
            assert_eq!(alloc.peek(&scope).await.unwrap().to_string(), "N001");
            assert_eq!(alloc.peek(&scope).await.unwrap().to_string(), "N001");
        }
    }
}
