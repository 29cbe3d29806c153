// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API over the queue engine.
//!
//! A thin axum layer: every route resolves the calling actor, forwards to
//! one `TurnService` operation, and maps `TurnosError` onto a status code
//! with a JSON body carrying the error kind.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::{AuthConfig, RequestActor};
pub use error::ApiError;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
