// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use turnos_config::model::GatewayConfig;
use turnos_core::TurnosError;
use turnos_engine::TurnService;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            start_time: std::time::Instant::now(),
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<TurnService>,
    pub auth: AuthConfig,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(service: Arc<TurnService>, auth: AuthConfig) -> Self {
        Self {
            service,
            auth,
            health: HealthState::default(),
        }
    }
}

/// Address and credentials the server binds with.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token for `/v1` routes (None = no token check).
    pub bearer_token: Option<String>,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            bearer_token: config.bearer_token.clone(),
        }
    }
}

impl ServerConfig {
    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            bearer_token: self.bearer_token.clone(),
        }
    }
}

/// Assemble the router:
/// - GET /health (no auth)
/// - /v1/turns and /v1/service-points routes (bearer auth when configured)
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/turns",
            post(handlers::post_turn).get(handlers::list_turns),
        )
        .route("/v1/turns/{id}", get(handlers::get_turn))
        .route("/v1/turns/{id}/state", post(handlers::post_turn_state))
        .route("/v1/service-points", get(handlers::list_service_points))
        .route("/v1/service-points/{id}/queue", get(handlers::get_queue))
        .route("/v1/service-points/{id}/current", get(handlers::get_current))
        .route(
            "/v1/service-points/{id}/occupied",
            get(handlers::get_occupied),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind to the configured host:port and serve until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), TurnosError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TurnosError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| TurnosError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
