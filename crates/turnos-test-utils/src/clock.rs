// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Controllable clock for tests.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use turnos_core::Clock;

/// A clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// `hour:minute` local time on `date` at UTC-5.
    ///
    /// # Panics
    ///
    /// Panics on an invalid hour or minute.
    pub fn bogota(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let offset = FixedOffset::west_opt(5 * 3600).expect("valid offset");
        let local = date
            .and_hms_opt(hour, minute, 0)
            .expect("valid time of day");
        let now = offset
            .from_local_datetime(&local)
            .single()
            .expect("fixed offsets are unambiguous");
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    /// Move to the same time of day on the following day.
    pub fn next_day(&self) {
        self.advance(Duration::days(1));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
