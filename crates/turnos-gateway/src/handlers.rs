// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use turnos_core::{
    CurrentAndNext, PriorityClass, QueueView, ServicePoint, ServicePointId, Turn, TurnFilter,
    TurnId, TurnState,
};
use turnos_engine::CreateTurnRequest;

use crate::auth::RequestActor;
use crate::error::ApiError;
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Query string for GET /v1/turns.
#[derive(Debug, Default, Deserialize)]
pub struct TurnQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub state: Option<TurnState>,
    #[serde(default)]
    pub priority: Option<PriorityClass>,
    #[serde(default)]
    pub service_point: Option<i64>,
}

impl From<TurnQuery> for TurnFilter {
    fn from(query: TurnQuery) -> Self {
        TurnFilter {
            service_point: query.service_point.map(ServicePointId),
            date: query.date,
            state: query.state,
            priority: query.priority,
            requester: None,
        }
    }
}

/// Query string carrying an optional day.
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Request body for POST /v1/turns/{id}/state.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateChange {
    pub state: TurnState,
}

/// Response body for GET /v1/service-points/{id}/occupied.
#[derive(Debug, Serialize)]
pub struct OccupiedResponse {
    pub service_point: ServicePointId,
    pub date: NaiveDate,
    pub times: Vec<String>,
}

/// Public board plus the label shown for the next turn.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    #[serde(flatten)]
    pub board: CurrentAndNext,
    pub next_label: String,
}

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// POST /v1/turns
pub async fn post_turn(
    State(state): State<GatewayState>,
    RequestActor(actor): RequestActor,
    Json(body): Json<CreateTurnRequest>,
) -> Result<(StatusCode, Json<Turn>), ApiError> {
    let turn = state.service.create_turn(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(turn)))
}

/// GET /v1/turns
pub async fn list_turns(
    State(state): State<GatewayState>,
    RequestActor(actor): RequestActor,
    Query(query): Query<TurnQuery>,
) -> Result<Json<Vec<Turn>>, ApiError> {
    let turns = state.service.list_turns(&actor, query.into()).await?;
    Ok(Json(turns))
}

/// GET /v1/turns/{id}
pub async fn get_turn(
    State(state): State<GatewayState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<i64>,
) -> Result<Json<Turn>, ApiError> {
    let turn = state.service.get_turn(&actor, TurnId(id)).await?;
    Ok(Json(turn))
}

/// POST /v1/turns/{id}/state
pub async fn post_turn_state(
    State(state): State<GatewayState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<i64>,
    Json(body): Json<StateChange>,
) -> Result<Json<Turn>, ApiError> {
    let turn = state
        .service
        .transition_state(&actor, TurnId(id), body.state)
        .await?;
    Ok(Json(turn))
}

/// GET /v1/service-points
pub async fn list_service_points(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<ServicePoint>>, ApiError> {
    Ok(Json(state.service.list_active_service_points().await?))
}

/// GET /v1/service-points/{id}/queue
pub async fn get_queue(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<QueueView>, ApiError> {
    let view = state
        .service
        .queue_view(ServicePointId(id), query.date)
        .await?;
    Ok(Json(view))
}

/// GET /v1/service-points/{id}/current
pub async fn get_current(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<BoardResponse>, ApiError> {
    let board = state
        .service
        .current_and_next(ServicePointId(id), query.date)
        .await?;
    Ok(Json(BoardResponse {
        next_label: board.next_label(),
        board,
    }))
}

/// GET /v1/service-points/{id}/occupied
pub async fn get_occupied(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<OccupiedResponse>, ApiError> {
    let date = query
        .date
        .unwrap_or_else(|| state.service.clock().today());
    let times = state
        .service
        .occupied_times(ServicePointId(id), date)
        .await?;
    Ok(Json(OccupiedResponse {
        service_point: ServicePointId(id),
        date,
        times,
    }))
}
