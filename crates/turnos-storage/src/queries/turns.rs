// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn persistence: sequence lookup, conflict-checked insert, filtered
//! listing, and compare-and-set state updates.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, params, params_from_iter};
use turnos_core::{
    NewTurn, PriorityClass, Scope, Turn, TurnFilter, TurnId, TurnNumber, TurnState, TurnosError,
    UserRef,
};

use crate::database::{Database, is_unique_violation, map_tr_err};
use crate::queries::parse_column;

const TURN_COLUMNS: &str = "id, number, service_point_id, requester, appointment_type, date, \
     request_timestamp, state, attended_timestamp, description";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn row_to_turn(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    let number: TurnNumber = parse_column(row, 1)?;
    let date: String = row.get(5)?;
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let attended: Option<String> = row.get(8)?;
    let attended_timestamp = attended
        .map(|ts| {
            DateTime::parse_from_rfc3339(&ts).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    8,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()?;

    Ok(Turn {
        id: TurnId(row.get(0)?),
        priority_class: number.priority,
        number,
        service_point_ref: turnos_core::ServicePointId(row.get(2)?),
        requester_ref: UserRef::new(row.get::<_, String>(3)?),
        appointment_type: row.get(4)?,
        date,
        request_timestamp: parse_column::<DateTime<FixedOffset>>(row, 6)?,
        state: parse_column(row, 7)?,
        attended_timestamp,
        description: row.get(9)?,
    })
}

fn prefix_text(priority: PriorityClass) -> String {
    priority.prefix().to_string()
}

fn fetch_turn(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Turn>> {
    conn.query_row(
        &format!("SELECT {TURN_COLUMNS} FROM turns WHERE id = ?1"),
        params![id],
        row_to_turn,
    )
    .optional()
}

/// Highest sequence used in `scope`, counting every state.
pub async fn max_sequence(db: &Database, scope: &Scope) -> Result<u32, TurnosError> {
    let service_point = scope.service_point.0;
    let date = scope.date.format(DATE_FORMAT).to_string();
    let priority = prefix_text(scope.priority);
    let max: i64 = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COALESCE(MAX(sequence), 0) FROM turns
                 WHERE service_point_id = ?1 AND date = ?2 AND priority = ?3",
                params![service_point, date, priority],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    u32::try_from(max).map_err(|_| TurnosError::Internal(format!("sequence {max} out of range")))
}

/// Insert a new turn. A duplicate number in the same scope is a `Conflict`.
pub async fn insert_turn(db: &Database, turn: &NewTurn) -> Result<Turn, TurnosError> {
    let scope = turn.scope();
    let service_point = turn.service_point_ref.0;
    let date = turn.date.format(DATE_FORMAT).to_string();
    let priority = prefix_text(turn.number.priority);
    let sequence = i64::from(turn.number.sequence);
    let number = turn.number.to_string();
    let requester = turn.requester_ref.as_str().to_string();
    let appointment_type = turn.appointment_type.clone();
    let requested_at = turn.request_timestamp.to_rfc3339();
    let description = turn.description.clone();

    let inserted = db
        .connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            let result = conn.execute(
                "INSERT INTO turns (service_point_id, date, priority, sequence, number,
                     requester, appointment_type, request_timestamp, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    service_point,
                    date,
                    priority,
                    sequence,
                    number,
                    requester,
                    appointment_type,
                    requested_at,
                    description,
                ],
            );
            match result {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match inserted {
        Some(id) => Ok(turn.clone().into_turn(TurnId(id))),
        None => Err(TurnosError::Conflict {
            scope: scope.to_string(),
        }),
    }
}

/// Fetch a turn by id.
pub async fn get_turn(db: &Database, id: TurnId) -> Result<Option<Turn>, TurnosError> {
    let id = id.0;
    db.connection()
        .call(move |conn| -> Result<Option<Turn>, rusqlite::Error> { fetch_turn(conn, id) })
        .await
        .map_err(map_tr_err)
}

/// List turns matching `filter`, ordered by day, point, class, then sequence.
pub async fn query_turns(db: &Database, filter: &TurnFilter) -> Result<Vec<Turn>, TurnosError> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(point) = filter.service_point {
        clauses.push("service_point_id = ?");
        values.push(Value::Integer(point.0));
    }
    if let Some(date) = filter.date {
        clauses.push("date = ?");
        values.push(Value::Text(date.format(DATE_FORMAT).to_string()));
    }
    if let Some(state) = filter.state {
        clauses.push("state = ?");
        values.push(Value::Text(state.to_string()));
    }
    if let Some(priority) = filter.priority {
        clauses.push("priority = ?");
        values.push(Value::Text(prefix_text(priority)));
    }
    if let Some(requester) = &filter.requester {
        clauses.push("requester = ?");
        values.push(Value::Text(requester.as_str().to_string()));
    }

    let mut sql = format!("SELECT {TURN_COLUMNS} FROM turns");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY date, service_point_id, priority, sequence, id");

    db.connection()
        .call(move |conn| -> Result<Vec<Turn>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), row_to_turn)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

enum UpdateOutcome {
    Updated(Turn),
    Stale,
    Missing,
}

/// Move a turn from `expected` to `new_state`.
///
/// The attended timestamp is only written while still empty.
pub async fn update_state(
    db: &Database,
    id: TurnId,
    expected: TurnState,
    new_state: TurnState,
    attended_at: Option<DateTime<FixedOffset>>,
) -> Result<Turn, TurnosError> {
    let raw_id = id.0;
    let expected_text = expected.to_string();
    let new_text = new_state.to_string();
    let attended_text = attended_at.map(|ts| ts.to_rfc3339());

    let outcome = db
        .connection()
        .call(move |conn| -> Result<UpdateOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE turns
                 SET state = ?1, attended_timestamp = COALESCE(attended_timestamp, ?2)
                 WHERE id = ?3 AND state = ?4",
                params![new_text, attended_text, raw_id, expected_text],
            )?;
            let current = fetch_turn(&tx, raw_id)?;
            tx.commit()?;
            Ok(match (changed, current) {
                (_, None) => UpdateOutcome::Missing,
                (0, Some(_)) => UpdateOutcome::Stale,
                (_, Some(turn)) => UpdateOutcome::Updated(turn),
            })
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        UpdateOutcome::Updated(turn) => Ok(turn),
        UpdateOutcome::Stale => Err(TurnosError::Conflict {
            scope: format!("turn {id} is no longer {expected}"),
        }),
        UpdateOutcome::Missing => Err(TurnosError::missing_turn(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::service_points::upsert_service_point;
    use tempfile::tempdir;
    use turnos_core::{ServicePoint, ServicePointId};

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("turns.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        upsert_service_point(
            &db,
            &ServicePoint {
                id: ServicePointId(1),
                name: "Meléndez".into(),
                location: "Calle 123".into(),
                active: true,
                services: vec!["Consulta General".into()],
                assigned_staff: None,
            },
        )
        .await
        .unwrap();
        (db, dir)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn new_turn(priority: PriorityClass, sequence: u32) -> NewTurn {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        NewTurn {
            number: TurnNumber::new(priority, sequence),
            service_point_ref: ServicePointId(1),
            requester_ref: UserRef::new("citizen-1"),
            appointment_type: "general".into(),
            date: day(),
            request_timestamp: DateTime::parse_from_rfc3339("2026-03-02T09:15:00-05:00")
                .unwrap()
                .with_timezone(&offset),
            description: Some("first visit".into()),
        }
    }

    #[tokio::test]
    async fn max_sequence_starts_at_zero() {
        let (db, _dir) = setup().await;
        let scope = new_turn(PriorityClass::Normal, 1).scope();
        assert_eq!(max_sequence(&db, &scope).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let (db, _dir) = setup().await;
        let inserted = insert_turn(&db, &new_turn(PriorityClass::Normal, 1))
            .await
            .unwrap();
        assert_eq!(inserted.number.to_string(), "N001");
        assert_eq!(inserted.state, TurnState::Waiting);

        let fetched = get_turn(&db, inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched, inserted);
        assert_eq!(
            max_sequence(&db, &inserted.scope()).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn duplicate_number_is_conflict() {
        let (db, _dir) = setup().await;
        insert_turn(&db, &new_turn(PriorityClass::Normal, 1))
            .await
            .unwrap();
        let err = insert_turn(&db, &new_turn(PriorityClass::Normal, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TurnosError::Conflict { .. }));
    }

    #[tokio::test]
    async fn priority_classes_have_separate_sequences() {
        let (db, _dir) = setup().await;
        insert_turn(&db, &new_turn(PriorityClass::Normal, 1))
            .await
            .unwrap();
        insert_turn(&db, &new_turn(PriorityClass::Priority, 1))
            .await
            .unwrap();
        let scope = new_turn(PriorityClass::Priority, 1).scope();
        assert_eq!(max_sequence(&db, &scope).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn query_filters_by_state_and_orders_by_sequence() {
        let (db, _dir) = setup().await;
        let second = insert_turn(&db, &new_turn(PriorityClass::Normal, 2))
            .await
            .unwrap();
        insert_turn(&db, &new_turn(PriorityClass::Normal, 1))
            .await
            .unwrap();
        update_state(&db, second.id, TurnState::Waiting, TurnState::Cancelled, None)
            .await
            .unwrap();

        let all = query_turns(&db, &TurnFilter::day(ServicePointId(1), day()))
            .await
            .unwrap();
        let numbers: Vec<String> = all.iter().map(|t| t.number.to_string()).collect();
        assert_eq!(numbers, vec!["N001", "N002"]);

        let waiting = query_turns(
            &db,
            &TurnFilter::day(ServicePointId(1), day()).with_state(TurnState::Waiting),
        )
        .await
        .unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].number.sequence, 1);
    }

    #[tokio::test]
    async fn update_state_is_compare_and_set() {
        let (db, _dir) = setup().await;
        let turn = insert_turn(&db, &new_turn(PriorityClass::Normal, 1))
            .await
            .unwrap();
        update_state(&db, turn.id, TurnState::Waiting, TurnState::InProgress, None)
            .await
            .unwrap();

        let stale = update_state(&db, turn.id, TurnState::Waiting, TurnState::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(stale, TurnosError::Conflict { .. }));

        let missing = update_state(&db, TurnId(999), TurnState::Waiting, TurnState::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(missing, TurnosError::NotFound { .. }));
    }

    #[tokio::test]
    async fn attended_timestamp_is_written_once() {
        let (db, _dir) = setup().await;
        let turn = insert_turn(&db, &new_turn(PriorityClass::Normal, 1))
            .await
            .unwrap();
        let first = DateTime::parse_from_rfc3339("2026-03-02T10:00:00-05:00").unwrap();
        let later = DateTime::parse_from_rfc3339("2026-03-02T11:00:00-05:00").unwrap();

        update_state(&db, turn.id, TurnState::Waiting, TurnState::InProgress, None)
            .await
            .unwrap();
        let attended = update_state(
            &db,
            turn.id,
            TurnState::InProgress,
            TurnState::Attended,
            Some(first),
        )
        .await
        .unwrap();
        assert_eq!(attended.attended_timestamp, Some(first));

        let again = update_state(
            &db,
            turn.id,
            TurnState::Attended,
            TurnState::Attended,
            Some(later),
        )
        .await
        .unwrap();
        assert_eq!(again.attended_timestamp, Some(first));
    }
}
