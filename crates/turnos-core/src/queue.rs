// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read models returned by the queue views.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::turn::Turn;
use crate::types::ServicePointId;

/// Staff-facing dispatch view of one service point and day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueView {
    pub service_point: ServicePointId,
    pub date: NaiveDate,
    /// The turn being attended, if any.
    pub current: Option<Turn>,
    /// First waiting turn in dispatch order.
    pub next: Option<Turn>,
    /// In-progress turns, then waiting turns interleaved 1 priority to 2
    /// normal, then attended and cancelled turns.
    pub ordered: Vec<Turn>,
}

/// Public display board: who is being served and who is called next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAndNext {
    pub service_point: ServicePointId,
    pub date: NaiveDate,
    pub current: Option<Turn>,
    pub next: Option<Turn>,
    pub waiting_count: usize,
    pub estimated_wait_minutes: u64,
}

impl CurrentAndNext {
    /// The label shown for the next turn, `"Ninguno"` when nobody waits.
    pub fn next_label(&self) -> String {
        self.next
            .as_ref()
            .map(|turn| turn.number.to_string())
            .unwrap_or_else(|| "Ninguno".to_string())
    }
}
