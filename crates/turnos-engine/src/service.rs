// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `TurnService`: the operations exposed to the API layer.
//!
//! Wires the allocator, ordering engine, state machine, and creation policy
//! to the store, registry, and clock collaborators. Every mutation touches a
//! single turn or a single allocation scope.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use turnos_config::TurnosConfig;
use turnos_core::{
    Actor, Clock, CurrentAndNext, PriorityClass, QueueView, Role, ServicePoint, ServicePointId,
    ServicePointRegistry, Turn, TurnFilter, TurnId, TurnState, TurnStore, TurnosError, UserRef,
};

use crate::allocator::{Allocator, TurnDraft};
use crate::ordering;
use crate::policy::CreationPolicy;
use crate::recording;
use crate::state::{self, TransitionPlan};

/// Compare-and-set attempts for a state change racing another writer.
const TRANSITION_ATTEMPTS: u32 = 3;

/// Input for [`TurnService::create_turn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTurnRequest {
    pub service_point: ServicePointId,
    #[serde(default = "default_priority")]
    pub priority: PriorityClass,
    pub appointment_type: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Day of the appointment; today when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Who the turn is for. Ignored for citizens, who always book for
    /// themselves.
    #[serde(default)]
    pub requester: Option<UserRef>,
}

fn default_priority() -> PriorityClass {
    PriorityClass::Normal
}

impl CreateTurnRequest {
    pub fn new(service_point: ServicePointId, priority: PriorityClass, appointment_type: &str) -> Self {
        Self {
            service_point,
            priority,
            appointment_type: appointment_type.to_string(),
            description: None,
            date: None,
            requester: None,
        }
    }
}

/// Queue engine facade.
pub struct TurnService {
    store: Arc<dyn TurnStore>,
    registry: Arc<dyn ServicePointRegistry>,
    clock: Arc<dyn Clock>,
    allocator: Allocator,
    policy: CreationPolicy,
    minutes_per_turn: u32,
}

impl TurnService {
    pub fn new(
        store: Arc<dyn TurnStore>,
        registry: Arc<dyn ServicePointRegistry>,
        clock: Arc<dyn Clock>,
        config: &TurnosConfig,
    ) -> Self {
        Self {
            allocator: Allocator::new(Arc::clone(&store), &config.allocator),
            store,
            registry,
            clock,
            policy: CreationPolicy::new(config.service.allowed_windows.clone()),
            minutes_per_turn: config.service.minutes_per_turn,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    async fn service_point(&self, id: ServicePointId) -> Result<ServicePoint, TurnosError> {
        self.registry
            .get_service_point(id)
            .await?
            .ok_or_else(|| TurnosError::missing_service_point(id))
    }

    /// CreateTurn: validate, allocate a number, and persist as `Waiting`.
    pub async fn create_turn(
        &self,
        actor: &Actor,
        request: CreateTurnRequest,
    ) -> Result<Turn, TurnosError> {
        let appointment_type = request.appointment_type.trim();
        if appointment_type.is_empty() {
            return Err(TurnosError::Validation(
                "appointment_type must not be empty".to_string(),
            ));
        }

        let point = match self.registry.get_service_point(request.service_point).await? {
            Some(point) => point,
            None => {
                return Err(TurnosError::InvalidScope {
                    service_point: request.service_point,
                    reason: "unknown".to_string(),
                });
            }
        };

        let requester = match actor.role {
            Role::Citizen => actor.id.clone(),
            Role::Staff if !actor.manages(&point) => {
                return Err(TurnosError::PermissionDenied {
                    actor: actor.to_string(),
                    action: format!("create turns at service point {}", point.id),
                });
            }
            Role::Staff | Role::Admin => request.requester.unwrap_or_else(|| actor.id.clone()),
        };

        let now = self.clock.now();
        self.policy.check_hours(now)?;
        let date = self.policy.resolve_date(request.date, now.date_naive())?;

        let draft = TurnDraft {
            requester,
            priority: request.priority,
            appointment_type: appointment_type.to_string(),
            date,
            request_timestamp: now,
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        };
        self.allocator.allocate(&point, draft).await
    }

    /// GetQueueView: dispatch order plus current and next for one day.
    pub async fn queue_view(
        &self,
        service_point: ServicePointId,
        date: Option<NaiveDate>,
    ) -> Result<QueueView, TurnosError> {
        let point = self.service_point(service_point).await?;
        let date = date.unwrap_or_else(|| self.clock.today());
        let turns = self
            .store
            .query_turns(&TurnFilter::day(point.id, date))
            .await?;
        debug!(service_point = %point.id, %date, turns = turns.len(), "queue view");

        let ordered = ordering::order_for_display(turns);
        let current = ordered
            .iter()
            .find(|t| t.state == TurnState::InProgress)
            .cloned();
        let next = ordered
            .iter()
            .find(|t| t.state == TurnState::Waiting)
            .cloned();
        Ok(QueueView {
            service_point: point.id,
            date,
            current,
            next,
            ordered,
        })
    }

    /// CurrentAndNext: the public board with a wait estimate.
    pub async fn current_and_next(
        &self,
        service_point: ServicePointId,
        date: Option<NaiveDate>,
    ) -> Result<CurrentAndNext, TurnosError> {
        let point = self.service_point(service_point).await?;
        let date = date.unwrap_or_else(|| self.clock.today());
        let turns = self
            .store
            .query_turns(&TurnFilter::day(point.id, date))
            .await?;

        let (current, next) = ordering::current_and_next(&turns);
        let waiting_count = turns
            .iter()
            .filter(|t| t.state == TurnState::Waiting)
            .count();
        Ok(CurrentAndNext {
            service_point: point.id,
            date,
            current: current.cloned(),
            next: next.cloned(),
            waiting_count,
            estimated_wait_minutes: waiting_count as u64 * u64::from(self.minutes_per_turn),
        })
    }

    /// TransitionState: apply a state-machine edge on behalf of `actor`.
    ///
    /// A concurrent change between read and write is retried against the
    /// fresh state a bounded number of times.
    pub async fn transition_state(
        &self,
        actor: &Actor,
        turn_id: TurnId,
        new_state: TurnState,
    ) -> Result<Turn, TurnosError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let turn = self
                .store
                .get_turn(turn_id)
                .await?
                .ok_or_else(|| TurnosError::missing_turn(turn_id))?;
            let point = self.service_point(turn.service_point_ref).await?;

            state::authorize(actor, &turn, &point, new_state)?;
            let plan = state::plan_transition(&turn, new_state)?;
            if new_state == TurnState::Cancelled {
                state::check_not_past(&turn, self.clock.today())?;
            }

            let stamp_attended = match plan {
                TransitionPlan::Unchanged => {
                    debug!(turn_id = %turn.id, state = %turn.state, "transition is a no-op");
                    return Ok(turn);
                }
                TransitionPlan::Apply { stamp_attended } => stamp_attended,
            };
            let attended_at = stamp_attended.then(|| self.clock.now());

            match self
                .store
                .update_state(turn.id, turn.state, new_state, attended_at)
                .await
            {
                Ok(updated) => {
                    recording::record_transition(new_state);
                    info!(
                        turn_id = %updated.id,
                        number = %updated.number,
                        service_point = %updated.service_point_ref,
                        from = %turn.state,
                        to = %updated.state,
                        actor = %actor,
                        "turn state changed"
                    );
                    return Ok(updated);
                }
                Err(TurnosError::Conflict { .. }) if attempt < TRANSITION_ATTEMPTS => {
                    warn!(turn_id = %turn.id, attempt, "turn changed concurrently, re-reading");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// ListTurns: the turns `actor` may see, narrowed by `filter`.
    pub async fn list_turns(
        &self,
        actor: &Actor,
        filter: TurnFilter,
    ) -> Result<Vec<Turn>, TurnosError> {
        match actor.role {
            Role::Admin => self.store.query_turns(&filter).await,
            Role::Citizen => {
                let filter = TurnFilter {
                    requester: Some(actor.id.clone()),
                    ..filter
                };
                self.store.query_turns(&filter).await
            }
            Role::Staff => {
                let managed: HashSet<ServicePointId> = self
                    .registry
                    .list_service_points()
                    .await?
                    .into_iter()
                    .filter(|p| actor.manages(p))
                    .map(|p| p.id)
                    .collect();
                if filter
                    .service_point
                    .is_some_and(|id| !managed.contains(&id))
                    || managed.is_empty()
                {
                    return Ok(Vec::new());
                }
                let mut turns = self.store.query_turns(&filter).await?;
                turns.retain(|t| managed.contains(&t.service_point_ref));
                Ok(turns)
            }
        }
    }

    /// Fetch one turn, hiding turns `actor` may not see.
    pub async fn get_turn(&self, actor: &Actor, turn_id: TurnId) -> Result<Turn, TurnosError> {
        let turn = self
            .store
            .get_turn(turn_id)
            .await?
            .ok_or_else(|| TurnosError::missing_turn(turn_id))?;
        let visible = match actor.role {
            Role::Admin => true,
            Role::Citizen => turn.requester_ref == actor.id,
            Role::Staff => self
                .registry
                .get_service_point(turn.service_point_ref)
                .await?
                .is_some_and(|p| actor.manages(&p)),
        };
        if visible {
            Ok(turn)
        } else {
            Err(TurnosError::missing_turn(turn_id))
        }
    }

    /// OccupiedTimes: local `HH:MM` request times of a day's live turns.
    pub async fn occupied_times(
        &self,
        service_point: ServicePointId,
        date: NaiveDate,
    ) -> Result<Vec<String>, TurnosError> {
        let point = self.service_point(service_point).await?;
        let offset = *self.clock.now().offset();
        let mut times: Vec<String> = self
            .store
            .query_turns(&TurnFilter::day(point.id, date))
            .await?
            .into_iter()
            .filter(|t| t.state != TurnState::Cancelled)
            .map(|t| {
                t.request_timestamp
                    .with_timezone(&offset)
                    .format("%H:%M")
                    .to_string()
            })
            .collect();
        times.sort();
        Ok(times)
    }

    /// ListActiveServicePoints, ordered by id.
    pub async fn list_active_service_points(&self) -> Result<Vec<ServicePoint>, TurnosError> {
        let mut points = self.registry.list_service_points().await?;
        points.retain(|p| p.active);
        Ok(points)
    }
}
