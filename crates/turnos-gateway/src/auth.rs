// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication for the `/v1` routes.
//!
//! Two layers:
//! 1. Bearer token (`Authorization: Bearer <token>`), checked by
//!    middleware when a token is configured.
//! 2. Actor identity from `X-Actor-Id` and `X-Actor-Role`, resolved per
//!    handler by the [`RequestActor`] extractor.
//!
//! Without a configured token the middleware lets requests through and the
//! actor headers are trusted as set by an upstream proxy.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use turnos_core::{Actor, Role, UserRef};

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Authentication configuration for the gateway.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. If `Some`, bearer auth is enforced.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware that validates the bearer token when one is configured.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(ref expected_token) = auth.bearer_token else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected_token => Ok(next.run(request).await),
        _ => {
            tracing::debug!(path = %request.uri().path(), "bearer token rejected");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// The actor a request runs as, taken from the actor headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestActor(pub Actor);

impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let id = header(ACTOR_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("missing {ACTOR_ID_HEADER} header")))?;
        let role = match header(ACTOR_ROLE_HEADER) {
            None => Role::Citizen,
            Some(raw) => raw.to_ascii_lowercase().parse::<Role>().map_err(|_| {
                ApiError::Unauthenticated(format!("unknown role '{raw}'"))
            })?,
        };

        Ok(RequestActor(Actor {
            id: UserRef::new(id),
            role,
        }))
    }
}
