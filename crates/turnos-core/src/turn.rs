// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The turn record, its ticket number, and its allocation scope.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::TurnosError;
use crate::types::{PriorityClass, ServicePointId, TurnId, TurnState, UserRef};

/// Minimum number of digits in a rendered sequence.
pub const SEQUENCE_WIDTH: usize = 3;

/// A human-readable ticket code such as `N001` or `P007`.
///
/// The numeric part is zero-padded to [`SEQUENCE_WIDTH`] digits. Sequences
/// past 999 render with more digits (`N1000`) rather than wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TurnNumber {
    pub priority: PriorityClass,
    pub sequence: u32,
}

impl TurnNumber {
    pub fn new(priority: PriorityClass, sequence: u32) -> Self {
        Self { priority, sequence }
    }
}

impl fmt::Display for TurnNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.priority.prefix(),
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for TurnNumber {
    type Err = TurnosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let priority = chars
            .next()
            .and_then(PriorityClass::from_prefix)
            .ok_or_else(|| TurnosError::Validation(format!("turn number `{s}` has no N/P prefix")))?;
        let digits = chars.as_str();
        if digits.len() < SEQUENCE_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TurnosError::Validation(format!(
                "turn number `{s}` needs at least {SEQUENCE_WIDTH} digits"
            )));
        }
        let sequence = digits
            .parse::<u32>()
            .map_err(|e| TurnosError::Validation(format!("turn number `{s}`: {e}")))?;
        if sequence == 0 {
            return Err(TurnosError::Validation(format!(
                "turn number `{s}` has a zero sequence"
            )));
        }
        Ok(Self { priority, sequence })
    }
}

impl From<TurnNumber> for String {
    fn from(number: TurnNumber) -> Self {
        number.to_string()
    }
}

impl TryFrom<String> for TurnNumber {
    type Error = TurnosError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The tuple within which ticket numbers must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    pub service_point: ServicePointId,
    pub date: NaiveDate,
    pub priority: PriorityClass,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.service_point,
            self.date,
            self.priority.prefix()
        )
    }
}

/// A queued service request with its ticket number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub number: TurnNumber,
    pub service_point_ref: ServicePointId,
    pub requester_ref: UserRef,
    pub appointment_type: String,
    pub priority_class: PriorityClass,
    /// Local calendar day the turn belongs to. Never changes.
    pub date: NaiveDate,
    pub request_timestamp: DateTime<FixedOffset>,
    pub state: TurnState,
    /// Set once, on entering `Attended`.
    pub attended_timestamp: Option<DateTime<FixedOffset>>,
    pub description: Option<String>,
}

impl Turn {
    pub fn scope(&self) -> Scope {
        Scope {
            service_point: self.service_point_ref,
            date: self.date,
            priority: self.priority_class,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// A turn ready to be persisted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTurn {
    pub number: TurnNumber,
    pub service_point_ref: ServicePointId,
    pub requester_ref: UserRef,
    pub appointment_type: String,
    pub date: NaiveDate,
    pub request_timestamp: DateTime<FixedOffset>,
    pub description: Option<String>,
}

impl NewTurn {
    pub fn scope(&self) -> Scope {
        Scope {
            service_point: self.service_point_ref,
            date: self.date,
            priority: self.number.priority,
        }
    }

    /// The persisted form: state `Waiting`, never attended.
    pub fn into_turn(self, id: TurnId) -> Turn {
        Turn {
            id,
            priority_class: self.number.priority,
            number: self.number,
            service_point_ref: self.service_point_ref,
            requester_ref: self.requester_ref,
            appointment_type: self.appointment_type,
            date: self.date,
            request_timestamp: self.request_timestamp,
            state: TurnState::Waiting,
            attended_timestamp: None,
            description: self.description,
        }
    }
}

/// Selection criteria for turn queries. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnFilter {
    pub service_point: Option<ServicePointId>,
    pub date: Option<NaiveDate>,
    pub state: Option<TurnState>,
    pub priority: Option<PriorityClass>,
    pub requester: Option<UserRef>,
}

impl TurnFilter {
    /// All turns of one service point on one day.
    pub fn day(service_point: ServicePointId, date: NaiveDate) -> Self {
        Self {
            service_point: Some(service_point),
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: TurnState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_priority(mut self, priority: PriorityClass) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn matches(&self, turn: &Turn) -> bool {
        self.service_point.is_none_or(|sp| sp == turn.service_point_ref)
            && self.date.is_none_or(|d| d == turn.date)
            && self.state.is_none_or(|s| s == turn.state)
            && self.priority.is_none_or(|p| p == turn.priority_class)
            && self
                .requester
                .as_ref()
                .is_none_or(|r| r == &turn.requester_ref)
    }
}
