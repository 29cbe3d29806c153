// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clock trait supplying local time in a fixed zone.

use chrono::{DateTime, FixedOffset, NaiveDate};

/// Source of the current local date and time.
///
/// All "day" boundaries are computed from this clock, in its fixed offset.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
