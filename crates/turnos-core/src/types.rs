// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common identifiers, enums, and actor/service-point types.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier of a persisted turn, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub i64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a service point ("punto de atención").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServicePointId(pub i64);

impl fmt::Display for ServicePointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a user (citizen or staff), by national id number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRef(pub String);

impl UserRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Queueing weight of a turn. Determines the number prefix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PriorityClass {
    #[serde(alias = "N")]
    #[strum(to_string = "normal", serialize = "N")]
    Normal,
    #[serde(alias = "P")]
    #[strum(to_string = "priority", serialize = "P")]
    Priority,
}

impl PriorityClass {
    /// Single-letter prefix used when rendering ticket numbers.
    pub fn prefix(self) -> char {
        match self {
            PriorityClass::Normal => 'N',
            PriorityClass::Priority => 'P',
        }
    }

    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            'N' => Some(PriorityClass::Normal),
            'P' => Some(PriorityClass::Priority),
            _ => None,
        }
    }
}

/// Lifecycle state of a turn.
///
/// `Attended` and `Cancelled` are terminal. The Spanish labels shown on
/// the service-point displays are accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    #[serde(alias = "En espera")]
    #[strum(to_string = "waiting", serialize = "En espera")]
    Waiting,
    #[serde(alias = "En progreso")]
    #[strum(to_string = "in_progress", serialize = "En progreso")]
    InProgress,
    #[serde(alias = "Atendido")]
    #[strum(to_string = "attended", serialize = "Atendido")]
    Attended,
    #[serde(alias = "Cancelado")]
    #[strum(to_string = "cancelled", serialize = "Cancelado")]
    Cancelled,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnState::Attended | TurnState::Cancelled)
    }

    /// Label shown on public displays.
    pub fn display_label(self) -> &'static str {
        match self {
            TurnState::Waiting => "En espera",
            TurnState::InProgress => "En progreso",
            TurnState::Attended => "Atendido",
            TurnState::Cancelled => "Cancelado",
        }
    }
}

/// What an actor is allowed to do system-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// A member of the public requesting turns for themselves.
    Citizen,
    /// A professional serving at the service points assigned to them.
    Staff,
    /// Full rights over every service point.
    Admin,
}

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserRef,
    pub role: Role,
}

impl Actor {
    pub fn citizen(id: impl Into<String>) -> Self {
        Self {
            id: UserRef::new(id),
            role: Role::Citizen,
        }
    }

    pub fn staff(id: impl Into<String>) -> Self {
        Self {
            id: UserRef::new(id),
            role: Role::Staff,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: UserRef::new(id),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True for administrators and for staff assigned to `point`.
    pub fn manages(&self, point: &ServicePoint) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Staff => point.assigned_staff.as_ref() == Some(&self.id),
            Role::Citizen => false,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role, self.id)
    }
}

/// A physical service point where turns are attended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePoint {
    pub id: ServicePointId,
    pub name: String,
    pub location: String,
    pub active: bool,
    /// Services offered, one entry per service.
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub assigned_staff: Option<UserRef>,
}

impl ServicePoint {
    /// Split a newline-separated service listing into trimmed, non-empty entries.
    pub fn parse_services(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Inverse of [`ServicePoint::parse_services`].
    pub fn services_text(&self) -> String {
        self.services.join("\n")
    }
}
