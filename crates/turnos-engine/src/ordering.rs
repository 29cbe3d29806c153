// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue ordering for the staff dispatch view and the public board.
//!
//! Waiting turns are merged in rounds: one priority turn, then up to two
//! normal turns, until both classes are drained. Within a class turns keep
//! ticket order, with the request time breaking ties.

use std::cmp::Ordering;

use turnos_core::{PriorityClass, Turn, TurnState};

/// Priority turns taken per round.
pub const PRIORITY_PER_ROUND: usize = 1;
/// Normal turns taken per round.
pub const NORMAL_PER_ROUND: usize = 2;

fn ticket_order(a: &Turn, b: &Turn) -> Ordering {
    a.number
        .sequence
        .cmp(&b.number.sequence)
        .then_with(|| a.request_timestamp.cmp(&b.request_timestamp))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order one service point's turns for a day.
///
/// In-progress turns come first, then the interleaved waiting turns, then
/// attended and cancelled turns in their input order.
pub fn order_for_display(turns: Vec<Turn>) -> Vec<Turn> {
    let mut in_progress = Vec::new();
    let mut waiting_priority = Vec::new();
    let mut waiting_normal = Vec::new();
    let mut other = Vec::new();

    for turn in turns {
        match (turn.state, turn.priority_class) {
            (TurnState::InProgress, _) => in_progress.push(turn),
            (TurnState::Waiting, PriorityClass::Priority) => waiting_priority.push(turn),
            (TurnState::Waiting, PriorityClass::Normal) => waiting_normal.push(turn),
            (TurnState::Attended | TurnState::Cancelled, _) => other.push(turn),
        }
    }

    in_progress.sort_by(ticket_order);
    waiting_priority.sort_by(ticket_order);
    waiting_normal.sort_by(ticket_order);

    let mut ordered = in_progress;
    ordered.extend(interleave(waiting_priority, waiting_normal));
    ordered.extend(other);
    ordered
}

/// Merge two already-sorted classes, `PRIORITY_PER_ROUND` priority turns
/// then `NORMAL_PER_ROUND` normal turns per round.
pub fn interleave<T>(priority: Vec<T>, normal: Vec<T>) -> Vec<T> {
    let mut merged = Vec::with_capacity(priority.len() + normal.len());
    let mut priority = priority.into_iter().peekable();
    let mut normal = normal.into_iter().peekable();

    while priority.peek().is_some() || normal.peek().is_some() {
        merged.extend(priority.by_ref().take(PRIORITY_PER_ROUND));
        merged.extend(normal.by_ref().take(NORMAL_PER_ROUND));
    }
    merged
}

/// The turn being served and the lowest-numbered waiting turn.
///
/// Only looks at ticket numbers, not the interleaving; this is what the
/// public board shows.
pub fn current_and_next(turns: &[Turn]) -> (Option<&Turn>, Option<&Turn>) {
    let current = turns
        .iter()
        .filter(|t| t.state == TurnState::InProgress)
        .min_by(|a, b| ticket_order(a, b));
    let next = turns
        .iter()
        .filter(|t| t.state == TurnState::Waiting)
        .min_by(|a, b| ticket_order(a, b));
    (current, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, NaiveDate};
    use proptest::prelude::*;
    use turnos_core::{ServicePointId, TurnId, TurnNumber, UserRef};

    fn turn(id: i64, priority: PriorityClass, sequence: u32, state: TurnState) -> Turn {
        let base = DateTime::parse_from_rfc3339("2026-03-02T08:00:00-05:00").unwrap();
        Turn {
            id: TurnId(id),
            number: TurnNumber::new(priority, sequence),
            service_point_ref: ServicePointId(1),
            requester_ref: UserRef::new(format!("citizen-{id}")),
            appointment_type: "general".into(),
            priority_class: priority,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            request_timestamp: base + Duration::minutes(id),
            state,
            attended_timestamp: None,
            description: None,
        }
    }

    fn labels(turns: &[Turn]) -> Vec<String> {
        turns.iter().map(|t| t.number.to_string()).collect()
    }

    use PriorityClass::{Normal, Priority};
    use TurnState::{Attended, Cancelled, InProgress, Waiting};

    #[test]
    fn one_priority_then_two_normal() {
        let turns = vec![
            turn(1, Normal, 1, Waiting),
            turn(2, Normal, 2, Waiting),
            turn(3, Normal, 3, Waiting),
            turn(4, Normal, 4, Waiting),
            turn(5, Priority, 1, Waiting),
            turn(6, Priority, 2, Waiting),
        ];
        assert_eq!(
            labels(&order_for_display(turns)),
            ["P001", "N001", "N002", "P002", "N003", "N004"]
        );
    }

    #[test]
    fn normal_only_is_fifo() {
        let turns = vec![turn(2, Normal, 2, Waiting), turn(1, Normal, 1, Waiting)];
        assert_eq!(labels(&order_for_display(turns)), ["N001", "N002"]);
    }

    #[test]
    fn priority_only_is_fifo() {
        let turns = vec![
            turn(3, Priority, 3, Waiting),
            turn(1, Priority, 1, Waiting),
            turn(2, Priority, 2, Waiting),
        ];
        assert_eq!(labels(&order_for_display(turns)), ["P001", "P002", "P003"]);
    }

    #[test]
    fn in_progress_first_and_terminal_last() {
        let turns = vec![
            turn(1, Normal, 1, Attended),
            turn(2, Normal, 2, Cancelled),
            turn(3, Normal, 3, Waiting),
            turn(4, Normal, 4, InProgress),
            turn(5, Priority, 1, Waiting),
        ];
        assert_eq!(
            labels(&order_for_display(turns)),
            ["N004", "P001", "N003", "N001", "N002"]
        );
    }

    #[test]
    fn empty_waiting_sets_leave_only_current() {
        let turns = vec![turn(1, Normal, 1, InProgress)];
        assert_eq!(labels(&order_for_display(turns)), ["N001"]);
        assert!(order_for_display(Vec::new()).is_empty());
    }

    #[test]
    fn surplus_priority_turns_drain_after_normals() {
        let merged = interleave(vec!["P1", "P2", "P3"], vec!["N1"]);
        assert_eq!(merged, ["P1", "N1", "P2", "P3"]);
    }

    #[test]
    fn current_and_next_uses_lowest_sequence() {
        let turns = vec![
            turn(1, Normal, 1, Attended),
            turn(2, Normal, 2, InProgress),
            turn(3, Priority, 1, Waiting),
            turn(4, Normal, 3, Waiting),
        ];
        let (current, next) = current_and_next(&turns);
        assert_eq!(current.unwrap().number.to_string(), "N002");
        assert_eq!(next.unwrap().number.to_string(), "P001");
    }

    #[test]
    fn next_breaks_sequence_ties_by_request_time() {
        let turns = vec![turn(9, Normal, 1, Waiting), turn(4, Priority, 1, Waiting)];
        let (_, next) = current_and_next(&turns);
        assert_eq!(next.unwrap().id, TurnId(4));
    }

    #[test]
    fn nothing_waiting_means_no_next() {
        let turns = vec![turn(1, Normal, 1, Cancelled)];
        assert_eq!(current_and_next(&turns), (None, None));
    }

    proptest! {
        #[test]
        fn ordering_is_a_permutation_that_keeps_class_order(
            states in prop::collection::vec((any::<bool>(), 0u8..4), 0..40)
        ) {
            let mut next_seq = [0u32; 2];
            let turns: Vec<Turn> = states
                .iter()
                .enumerate()
                .map(|(i, (is_priority, state))| {
                    let priority = if *is_priority { Priority } else { Normal };
                    let slot = usize::from(*is_priority);
                    next_seq[slot] += 1;
                    let state = match state {
                        0 => Waiting,
                        1 => InProgress,
                        2 => Attended,
                        _ => Cancelled,
                    };
                    turn(i as i64 + 1, priority, next_seq[slot], state)
                })
                .collect();

            let ordered = order_for_display(turns.clone());
            prop_assert_eq!(ordered.len(), turns.len());

            let mut ids: Vec<i64> = ordered.iter().map(|t| t.id.0).collect();
            ids.sort_unstable();
            let expected: Vec<i64> = (1..=turns.len() as i64).collect();
            prop_assert_eq!(ids, expected);

            for class in [Priority, Normal] {
                let seqs: Vec<u32> = ordered
                    .iter()
                    .filter(|t| t.state == Waiting && t.priority_class == class)
                    .map(|t| t.number.sequence)
                    .collect();
                prop_assert!(seqs.windows(2).all(|w| w[0] < w[1]));
            }

            let first_waiting = ordered.iter().position(|t| t.state == Waiting);
            let last_in_progress = ordered.iter().rposition(|t| t.state == InProgress);
            if let (Some(w), Some(p)) = (first_waiting, last_in_progress) {
                prop_assert!(p < w);
            }
        }
    }
}
