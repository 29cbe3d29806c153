// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call
//! is a no-op.

use metrics::describe_counter;
use turnos_core::{PriorityClass, TurnState};

/// Register all Turnos metric descriptions.
pub fn register_metrics() {
    describe_counter!("turnos_allocations_total", "Ticket numbers allocated");
    describe_counter!(
        "turnos_allocation_conflicts_total",
        "Allocation attempts that lost a uniqueness race and were retried"
    );
    describe_counter!("turnos_transitions_total", "Turn state transitions applied");
}

pub fn record_allocation(priority: PriorityClass) {
    metrics::counter!("turnos_allocations_total", "priority" => priority.to_string()).increment(1);
}

pub fn record_conflict() {
    metrics::counter!("turnos_allocation_conflicts_total").increment(1);
}

pub fn record_transition(to: TurnState) {
    metrics::counter!("turnos_transitions_total", "to" => to.to_string()).increment(1);
}
