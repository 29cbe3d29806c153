// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the TurnStore and ServicePointRegistry traits.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tokio::sync::OnceCell;
use tracing::debug;

use turnos_config::model::StorageConfig;
use turnos_core::{
    Adapter, HealthStatus, NewTurn, Scope, ServicePoint, ServicePointId, ServicePointRegistry,
    Turn, TurnFilter, TurnId, TurnState, TurnStore, TurnosError,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed store for turns and service points.
///
/// The database is opened lazily by [`SqliteStorage::initialize`]; every
/// other operation fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), TurnosError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| TurnosError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Insert or update a service point. Used for seeding and administration.
    pub async fn upsert_service_point(&self, point: &ServicePoint) -> Result<(), TurnosError> {
        queries::service_points::upsert_service_point(self.db()?, point).await
    }

    fn db(&self) -> Result<&Database, TurnosError> {
        self.db.get().ok_or_else(|| TurnosError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Adapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, TurnosError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TurnosError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl TurnStore for SqliteStorage {
    async fn max_sequence(&self, scope: &Scope) -> Result<u32, TurnosError> {
        queries::turns::max_sequence(self.db()?, scope).await
    }

    async fn insert_turn(&self, turn: &NewTurn) -> Result<Turn, TurnosError> {
        queries::turns::insert_turn(self.db()?, turn).await
    }

    async fn get_turn(&self, id: TurnId) -> Result<Option<Turn>, TurnosError> {
        queries::turns::get_turn(self.db()?, id).await
    }

    async fn query_turns(&self, filter: &TurnFilter) -> Result<Vec<Turn>, TurnosError> {
        queries::turns::query_turns(self.db()?, filter).await
    }

    async fn update_state(
        &self,
        id: TurnId,
        expected: TurnState,
        new_state: TurnState,
        attended_at: Option<DateTime<FixedOffset>>,
    ) -> Result<Turn, TurnosError> {
        queries::turns::update_state(self.db()?, id, expected, new_state, attended_at).await
    }
}

#[async_trait]
impl ServicePointRegistry for SqliteStorage {
    async fn get_service_point(
        &self,
        id: ServicePointId,
    ) -> Result<Option<ServicePoint>, TurnosError> {
        queries::service_points::get_service_point(self.db()?, id).await
    }

    async fn list_service_points(&self) -> Result<Vec<ServicePoint>, TurnosError> {
        queries::service_points::list_service_points(self.db()?).await
    }
}
