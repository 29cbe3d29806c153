// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State transitions, permissions, and creation policy.

use chrono::Duration;
use turnos_config::TimeWindow;
use turnos_core::{
    Actor, Clock, PriorityClass, ServicePointId, TurnFilter, TurnState, TurnosError, UserRef,
};
use turnos_engine::CreateTurnRequest;
use turnos_test_utils::TestHarness;

#[tokio::test]
async fn full_lifecycle_stamps_attended_once() {
    let h = TestHarness::builder().build().await.unwrap();
    let turn = h.request("ana", 1, PriorityClass::Normal).await.unwrap();

    let started = h.move_to(&turn, TurnState::InProgress).await.unwrap();
    assert_eq!(started.state, TurnState::InProgress);
    assert!(started.attended_timestamp.is_none());

    h.clock.advance(Duration::minutes(12));
    let attended = h.move_to(&turn, TurnState::Attended).await.unwrap();
    assert_eq!(attended.state, TurnState::Attended);
    assert_eq!(attended.attended_timestamp, Some(h.clock.now()));

    h.clock.advance(Duration::minutes(5));
    let again = h.move_to(&turn, TurnState::Attended).await.unwrap();
    assert_eq!(again, attended);
}

#[tokio::test]
async fn terminal_turns_reject_every_other_transition() {
    let h = TestHarness::builder().build().await.unwrap();
    let attended = h.request("ana", 1, PriorityClass::Normal).await.unwrap();
    h.move_to(&attended, TurnState::InProgress).await.unwrap();
    h.move_to(&attended, TurnState::Attended).await.unwrap();

    let cancelled = h.request("luis", 1, PriorityClass::Normal).await.unwrap();
    h.move_to(&cancelled, TurnState::Cancelled).await.unwrap();

    for to in [TurnState::Waiting, TurnState::InProgress, TurnState::Cancelled] {
        let err = h.move_to(&attended, to).await.unwrap_err();
        assert!(matches!(err, TurnosError::AlreadyTerminal { .. }), "{to}: {err}");
    }
    for to in [
        TurnState::Waiting,
        TurnState::InProgress,
        TurnState::Attended,
        TurnState::Cancelled,
    ] {
        let err = h.move_to(&cancelled, to).await.unwrap_err();
        assert!(matches!(err, TurnosError::AlreadyTerminal { .. }), "{to}: {err}");
    }
}

#[tokio::test]
async fn waiting_cannot_be_attended_directly() {
    let h = TestHarness::builder().build().await.unwrap();
    let turn = h.request("ana", 1, PriorityClass::Normal).await.unwrap();
    let err = h.move_to(&turn, TurnState::Attended).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_transition");
    assert_eq!(h.reload(turn.id).await.unwrap().state, TurnState::Waiting);
}

#[tokio::test]
async fn cancelling_yesterdays_turn_is_turn_in_past() {
    let h = TestHarness::builder().build().await.unwrap();
    let turn = h.request("ana", 1, PriorityClass::Normal).await.unwrap();
    h.clock.next_day();

    let err = h.move_to(&turn, TurnState::Cancelled).await.unwrap_err();
    assert!(matches!(err, TurnosError::TurnInPast { .. }));

    // Starting service has no time restriction.
    let started = h.move_to(&turn, TurnState::InProgress).await.unwrap();
    assert_eq!(started.state, TurnState::InProgress);
}

#[tokio::test]
async fn only_assigned_staff_or_admin_may_start_service() {
    let h = TestHarness::builder().build().await.unwrap();
    let turn = h.request("ana", 1, PriorityClass::Normal).await.unwrap();

    for actor in [
        Actor::staff("someone-else"),
        Actor::citizen("ana"),
        Actor::citizen("luis"),
    ] {
        let err = h
            .service
            .transition_state(&actor, turn.id, TurnState::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnosError::PermissionDenied { .. }), "{actor}");
    }

    let started = h
        .service
        .transition_state(&TestHarness::admin(), turn.id, TurnState::InProgress)
        .await
        .unwrap();
    assert_eq!(started.state, TurnState::InProgress);
}

#[tokio::test]
async fn requester_may_cancel_their_own_turn() {
    let h = TestHarness::builder().build().await.unwrap();
    let turn = h.request("ana", 2, PriorityClass::Normal).await.unwrap();

    let err = h
        .service
        .transition_state(&Actor::citizen("luis"), turn.id, TurnState::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, TurnosError::PermissionDenied { .. }));

    let cancelled = h
        .service
        .transition_state(&Actor::citizen("ana"), turn.id, TurnState::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.state, TurnState::Cancelled);
}

#[tokio::test]
async fn missing_turn_is_not_found() {
    let h = TestHarness::builder().build().await.unwrap();
    let err = h
        .service
        .transition_state(&TestHarness::admin(), turnos_core::TurnId(404), TurnState::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, TurnosError::NotFound { entity: "turn", .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_transitions_apply_exactly_once() {
    let h = TestHarness::builder().build().await.unwrap();
    let turn = h.request("ana", 1, PriorityClass::Normal).await.unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let service = h.service.clone();
            tokio::spawn(async move {
                service
                    .transition_state(&TestHarness::staff(), turn.id, TurnState::InProgress)
                    .await
            })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    let applied = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(applied, 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(matches!(err, TurnosError::InvalidTransition { .. }), "{err}");
    }
}

#[tokio::test]
async fn creation_outside_windows_is_rejected() {
    let windows = vec![TimeWindow::new(8, 12), TimeWindow::new(14, 16)];
    let h = TestHarness::builder()
        .with_windows(windows)
        .build()
        .await
        .unwrap();
    assert!(h.request("ana", 1, PriorityClass::Normal).await.is_ok());

    h.clock.advance(Duration::hours(4));
    let err = h.request("luis", 1, PriorityClass::Normal).await.unwrap_err();
    assert!(matches!(err, TurnosError::OutsideServiceHours { hour: 13 }));

    h.clock.advance(Duration::hours(1));
    assert!(h.request("luis", 1, PriorityClass::Normal).await.is_ok());
}

#[tokio::test]
async fn staff_create_only_at_their_point() {
    let h = TestHarness::builder().build().await.unwrap();

    let mut request = CreateTurnRequest::new(ServicePointId(1), PriorityClass::Priority, "general");
    request.requester = Some(UserRef::new("walk-in-7"));
    let turn = h
        .service
        .create_turn(&TestHarness::staff(), request)
        .await
        .unwrap();
    assert_eq!(turn.requester_ref, UserRef::new("walk-in-7"));
    assert_eq!(turn.number.to_string(), "P001");

    let elsewhere = CreateTurnRequest::new(ServicePointId(2), PriorityClass::Normal, "general");
    let err = h
        .service
        .create_turn(&TestHarness::staff(), elsewhere)
        .await
        .unwrap_err();
    assert!(matches!(err, TurnosError::PermissionDenied { .. }));
}

#[tokio::test]
async fn citizens_always_book_for_themselves() {
    let h = TestHarness::builder().build().await.unwrap();
    let mut request = CreateTurnRequest::new(ServicePointId(1), PriorityClass::Normal, "general");
    request.requester = Some(UserRef::new("someone-else"));
    request.description = Some("  ".into());

    let turn = h
        .service
        .create_turn(&Actor::citizen("ana"), request)
        .await
        .unwrap();
    assert_eq!(turn.requester_ref, UserRef::new("ana"));
    assert_eq!(turn.description, None);
}

#[tokio::test]
async fn blank_appointment_type_is_validation_error() {
    let h = TestHarness::builder().build().await.unwrap();
    let request = CreateTurnRequest::new(ServicePointId(1), PriorityClass::Normal, "   ");
    let err = h
        .service
        .create_turn(&Actor::citizen("ana"), request)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn visibility_follows_role() {
    let h = TestHarness::builder().build().await.unwrap();
    let at_one = h.request("ana", 1, PriorityClass::Normal).await.unwrap();
    let at_two = h.request("luis", 2, PriorityClass::Normal).await.unwrap();
    h.request("ana", 2, PriorityClass::Priority).await.unwrap();

    let all = h
        .service
        .list_turns(&TestHarness::admin(), TurnFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let mine = h
        .service
        .list_turns(&Actor::citizen("ana"), TurnFilter::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|t| t.requester_ref.as_str() == "ana"));

    let staff = h
        .service
        .list_turns(&TestHarness::staff(), TurnFilter::default())
        .await
        .unwrap();
    assert_eq!(staff, vec![at_one.clone()]);

    let staff_elsewhere = h
        .service
        .list_turns(
            &TestHarness::staff(),
            TurnFilter {
                service_point: Some(ServicePointId(2)),
                ..TurnFilter::default()
            },
        )
        .await
        .unwrap();
    assert!(staff_elsewhere.is_empty());

    assert!(h.service.get_turn(&TestHarness::staff(), at_one.id).await.is_ok());
    let hidden = h
        .service
        .get_turn(&TestHarness::staff(), at_two.id)
        .await
        .unwrap_err();
    assert!(matches!(hidden, TurnosError::NotFound { .. }));
    let hidden = h
        .service
        .get_turn(&Actor::citizen("ana"), at_two.id)
        .await
        .unwrap_err();
    assert!(matches!(hidden, TurnosError::NotFound { .. }));
}

#[tokio::test]
async fn list_filters_by_state() {
    let h = TestHarness::builder().build().await.unwrap();
    let first = h.request("ana", 1, PriorityClass::Normal).await.unwrap();
    h.request("luis", 1, PriorityClass::Normal).await.unwrap();
    h.move_to(&first, TurnState::Cancelled).await.unwrap();

    let waiting = h
        .service
        .list_turns(
            &TestHarness::admin(),
            TurnFilter::default().with_state(TurnState::Waiting),
        )
        .await
        .unwrap();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].number.to_string(), "N002");
}
