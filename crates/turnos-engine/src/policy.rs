// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Creation-time policy: request hours and the turn's day.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use turnos_config::model::TimeWindow;
use turnos_core::TurnosError;

/// Rules applied before a turn is allocated.
#[derive(Debug, Clone, Default)]
pub struct CreationPolicy {
    windows: Vec<TimeWindow>,
}

impl CreationPolicy {
    /// An empty window list accepts requests at any hour.
    pub fn new(windows: Vec<TimeWindow>) -> Self {
        Self { windows }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.windows.is_empty()
    }

    /// Reject requests made outside every configured window.
    pub fn check_hours(&self, now: DateTime<FixedOffset>) -> Result<(), TurnosError> {
        let hour = now.hour();
        if self.is_unrestricted() || self.windows.iter().any(|w| w.contains(hour)) {
            Ok(())
        } else {
            Err(TurnosError::OutsideServiceHours { hour })
        }
    }

    /// The day a new turn belongs to: `requested` if given, else today.
    pub fn resolve_date(
        &self,
        requested: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<NaiveDate, TurnosError> {
        match requested {
            Some(date) if date < today => Err(TurnosError::TurnInPast { date, today }),
            Some(date) => Ok(date),
            None => Ok(today),
        }
    }
}
