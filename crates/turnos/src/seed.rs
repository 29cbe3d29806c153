// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `turnos seed` command implementation.
//!
//! Registers the two sample service points so a fresh database can take
//! requests right away. Re-running updates them in place.

use tracing::info;
use turnos_config::TurnosConfig;
use turnos_core::{Adapter, ServicePoint, ServicePointId, TurnosError, UserRef};

use crate::serve::open_storage;

/// Staff member assigned to Meléndez in the seed data.
const SEED_STAFF_ID: &str = "87654321";

pub fn seed_points() -> Vec<ServicePoint> {
    vec![
        ServicePoint {
            id: ServicePointId(1),
            name: "Meléndez".to_string(),
            location: "Calle 123, Meléndez".to_string(),
            active: true,
            services: ServicePoint::parse_services("Consulta General\nExámenes Básicos"),
            assigned_staff: Some(UserRef::new(SEED_STAFF_ID)),
        },
        ServicePoint {
            id: ServicePointId(2),
            name: "Polvorines".to_string(),
            location: "Avenida 456, Polvorines".to_string(),
            active: true,
            services: ServicePoint::parse_services("Consulta Especializada\nRadiografías"),
            assigned_staff: None,
        },
    ]
}

/// Runs the `turnos seed` command.
pub async fn run_seed(config: &TurnosConfig) -> Result<(), TurnosError> {
    let storage = open_storage(config).await?;
    for point in seed_points() {
        storage.upsert_service_point(&point).await?;
        info!(service_point = %point.id, name = %point.name, "service point seeded");
        println!("seeded service point {} ({})", point.id, point.name);
    }
    storage.shutdown().await
}
