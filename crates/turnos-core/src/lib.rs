// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Turnos queue system.
//!
//! This crate provides the domain types (turns, ticket numbers, service
//! points, actors), the error taxonomy, and the collaborator traits the
//! queue engine depends on. Storage backends implement traits defined here.

pub mod error;
pub mod queue;
pub mod traits;
pub mod turn;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TurnosError;
pub use queue::{CurrentAndNext, QueueView};
pub use turn::{NewTurn, Scope, Turn, TurnFilter, TurnNumber};
pub use types::{
    Actor, HealthStatus, PriorityClass, Role, ServicePoint, ServicePointId, TurnId, TurnState,
    UserRef,
};

// Re-export all collaborator traits at crate root.
pub use traits::{Adapter, Clock, ServicePointRegistry, TurnStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turnos_error_kinds_are_distinct() {
        use chrono::NaiveDate;

        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let errors = [
            TurnosError::InvalidScope {
                service_point: ServicePointId(1),
                reason: "inactive".into(),
            },
            TurnosError::Conflict {
                scope: "1/2026-01-01/N".into(),
            },
            TurnosError::AllocationRetriesExhausted {
                scope: "1/2026-01-01/N".into(),
                attempts: 3,
            },
            TurnosError::SequenceExhausted {
                scope: "1/2026-01-01/N".into(),
                limit: 999,
            },
            TurnosError::TurnInPast { date, today: date },
            TurnosError::AlreadyTerminal {
                turn_id: TurnId(1),
                state: TurnState::Attended,
            },
            TurnosError::InvalidTransition {
                turn_id: TurnId(1),
                from: TurnState::Waiting,
                to: TurnState::Attended,
            },
            TurnosError::PermissionDenied {
                actor: "citizen 1".into(),
                action: "start turn".into(),
            },
            TurnosError::missing_turn(TurnId(9)),
            TurnosError::OutsideServiceHours { hour: 13 },
            TurnosError::Validation("test".into()),
            TurnosError::Config("test".into()),
            TurnosError::Storage {
                source: Box::new(std::io::Error::other("test")),
            },
            TurnosError::Internal("test".into()),
        ];

        let kinds: std::collections::HashSet<_> = errors.iter().map(TurnosError::kind).collect();
        assert_eq!(kinds.len(), errors.len(), "every error kind must be distinguishable");
    }

    #[test]
    fn only_conflicts_and_storage_are_transient() {
        assert!(TurnosError::Conflict { scope: "s".into() }.is_transient());
        assert!(
            TurnosError::Storage {
                source: Box::new(std::io::Error::other("disk"))
            }
            .is_transient()
        );
        assert!(!TurnosError::missing_service_point(ServicePointId(2)).is_transient());
        assert!(!TurnosError::Validation("bad".into()).is_transient());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compiles only if every collaborator trait is reachable from the root.
        fn _assert_adapter<T: Adapter>() {}
        fn _assert_store<T: TurnStore>() {}
        fn _assert_registry<T: ServicePointRegistry>() {}
        fn _assert_clock<T: Clock>() {}
    }
}
