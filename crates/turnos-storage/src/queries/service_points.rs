// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service point CRUD operations.

use rusqlite::{OptionalExtension, params};
use turnos_core::{ServicePoint, ServicePointId, TurnosError, UserRef};

use crate::database::{Database, map_tr_err};

fn row_to_point(row: &rusqlite::Row<'_>) -> rusqlite::Result<ServicePoint> {
    let services: String = row.get(4)?;
    let staff: Option<String> = row.get(5)?;
    Ok(ServicePoint {
        id: ServicePointId(row.get(0)?),
        name: row.get(1)?,
        location: row.get(2)?,
        active: row.get(3)?,
        services: ServicePoint::parse_services(&services),
        assigned_staff: staff.map(UserRef::new),
    })
}

/// Insert or replace a service point, keyed by its id.
pub async fn upsert_service_point(db: &Database, point: &ServicePoint) -> Result<(), TurnosError> {
    let id = point.id.0;
    let name = point.name.clone();
    let location = point.location.clone();
    let active = point.active;
    let services = point.services_text();
    let staff = point.assigned_staff.as_ref().map(|s| s.as_str().to_string());
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO service_points (id, name, location, active, services, assigned_staff)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     location = excluded.location,
                     active = excluded.active,
                     services = excluded.services,
                     assigned_staff = excluded.assigned_staff",
                params![id, name, location, active, services, staff],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a service point by id.
pub async fn get_service_point(
    db: &Database,
    id: ServicePointId,
) -> Result<Option<ServicePoint>, TurnosError> {
    let id = id.0;
    db.connection()
        .call(move |conn| -> Result<Option<ServicePoint>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, name, location, active, services, assigned_staff
                 FROM service_points WHERE id = ?1",
                params![id],
                row_to_point,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List every service point ordered by id.
pub async fn list_service_points(db: &Database) -> Result<Vec<ServicePoint>, TurnosError> {
    db.connection()
        .call(|conn| -> Result<Vec<ServicePoint>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, name, location, active, services, assigned_staff
                 FROM service_points ORDER BY id",
            )?;
            let rows = stmt.query_map([], row_to_point)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
