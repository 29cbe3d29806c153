// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall clock pinned to the configured local zone.

use chrono::{DateTime, FixedOffset, Utc};
use turnos_config::model::ServiceConfig;
use turnos_core::{Clock, TurnosError};

/// System time rendered in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build from `[service] utc_offset_minutes`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, TurnosError> {
        config.offset().map(Self::new).ok_or_else(|| {
            TurnosError::Config(format!(
                "utc_offset_minutes {} is not a valid offset",
                config.utc_offset_minutes
            ))
        })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}
