// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `turnos queue` command implementation.

use std::fmt::Write as _;

use chrono::NaiveDate;
use turnos_config::TurnosConfig;
use turnos_core::{Adapter, CurrentAndNext, QueueView, ServicePointId, TurnosError};

use crate::serve::{build_service, open_storage};

/// Runs the `turnos queue` command: prints the board header and the
/// dispatch order for one service point and day.
pub async fn run_queue(
    config: &TurnosConfig,
    service_point: i64,
    date: Option<NaiveDate>,
) -> Result<(), TurnosError> {
    let storage = open_storage(config).await?;
    let service = build_service(config, &storage)?;

    let view = service
        .queue_view(ServicePointId(service_point), date)
        .await?;
    let board = service
        .current_and_next(ServicePointId(service_point), Some(view.date))
        .await?;
    print!("{}", render_queue(&view, &board));

    storage.shutdown().await
}

/// Plain-text rendering of a queue view, one turn per line.
pub fn render_queue(view: &QueueView, board: &CurrentAndNext) -> String {
    let mut out = String::new();
    let current = view
        .current
        .as_ref()
        .map(|t| t.number.to_string())
        .unwrap_or_else(|| "Ninguno".to_string());

    let _ = writeln!(out, "Service point {} -- {}", view.service_point, view.date);
    let _ = writeln!(out, "Current: {current}");
    let _ = writeln!(
        out,
        "Next:    {} ({} waiting, ~{} min)",
        board.next_label(),
        board.waiting_count,
        board.estimated_wait_minutes
    );
    let _ = writeln!(out);
    for turn in &view.ordered {
        let _ = writeln!(
            out,
            "{:<6} {:<12} {:<10} {}",
            turn.number.to_string(),
            turn.state.display_label(),
            turn.requester_ref.as_str(),
            turn.appointment_type
        );
    }
    out
}
