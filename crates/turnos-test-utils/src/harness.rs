// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine testing.
//!
//! `TestHarness` assembles a `TurnService` over an in-memory store (or a
//! temp SQLite database), a settable clock, and a set of sample service
//! points.

use std::sync::Arc;

use chrono::NaiveDate;
use turnos_config::model::{StorageConfig, TimeWindow};
use turnos_config::TurnosConfig;
use turnos_core::{
    Actor, PriorityClass, ServicePoint, ServicePointId, ServicePointRegistry, Turn, TurnId,
    TurnState, TurnStore, TurnosError, UserRef,
};
use turnos_engine::{CreateTurnRequest, TurnService};
use turnos_storage::SqliteStorage;

use crate::clock::FixedClock;
use crate::memory_store::MemoryStore;

/// Staff member assigned to service point 1.
pub const STAFF_ID: &str = "87654321";

/// Sample points: an active point with assigned staff, an active point
/// without staff, and an inactive point.
pub fn sample_points() -> Vec<ServicePoint> {
    vec![
        ServicePoint {
            id: ServicePointId(1),
            name: "Meléndez".to_string(),
            location: "Calle 123, Meléndez".to_string(),
            active: true,
            services: vec!["Consulta General".to_string(), "Exámenes Básicos".to_string()],
            assigned_staff: Some(UserRef::new(STAFF_ID)),
        },
        ServicePoint {
            id: ServicePointId(2),
            name: "Polvorines".to_string(),
            location: "Avenida 456, Polvorines".to_string(),
            active: true,
            services: vec![
                "Consulta Especializada".to_string(),
                "Radiografías".to_string(),
            ],
            assigned_staff: None,
        },
        ServicePoint {
            id: ServicePointId(3),
            name: "Cerrado".to_string(),
            location: "Carrera 789".to_string(),
            active: false,
            services: Vec::new(),
            assigned_staff: None,
        },
    ]
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: TurnosConfig,
    today: NaiveDate,
    hour: u32,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: TurnosConfig::default(),
            today: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap_or_default(),
            hour: 9,
            sqlite: false,
        }
    }

    /// Start the clock at `hour:00` on `today`, local time.
    pub fn at(mut self, today: NaiveDate, hour: u32) -> Self {
        self.today = today;
        self.hour = hour;
        self
    }

    /// Restrict creation to the given request windows.
    pub fn with_windows(mut self, windows: Vec<TimeWindow>) -> Self {
        self.config.service.allowed_windows = windows;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.config.allocator.max_attempts = attempts;
        self
    }

    pub fn with_max_sequence(mut self, limit: u32) -> Self {
        self.config.allocator.max_sequence = limit;
        self
    }

    /// Back the service with a temp SQLite database instead of memory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, TurnosError> {
        let clock = Arc::new(FixedClock::bogota(self.today, self.hour, 0));

        let (store, registry, memory, temp_dir): (
            Arc<dyn TurnStore>,
            Arc<dyn ServicePointRegistry>,
            Option<Arc<MemoryStore>>,
            Option<tempfile::TempDir>,
        ) = if self.sqlite {
            let temp_dir =
                tempfile::TempDir::new().map_err(|e| TurnosError::Storage { source: e.into() })?;
            let storage = SqliteStorage::new(StorageConfig {
                database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
                wal_mode: true,
            });
            storage.initialize().await?;
            for point in sample_points() {
                storage.upsert_service_point(&point).await?;
            }
            let storage = Arc::new(storage);
            let store: Arc<dyn TurnStore> = storage.clone();
            let registry: Arc<dyn ServicePointRegistry> = storage;
            (store, registry, None, Some(temp_dir))
        } else {
            let memory = Arc::new(MemoryStore::with_points(sample_points()));
            let store: Arc<dyn TurnStore> = memory.clone();
            let registry: Arc<dyn ServicePointRegistry> = memory.clone();
            (store, registry, Some(memory), None)
        };

        let service = Arc::new(TurnService::new(
            Arc::clone(&store),
            registry,
            clock.clone(),
            &self.config,
        ));

        Ok(TestHarness {
            service,
            store,
            memory,
            clock,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment around a `TurnService`.
pub struct TestHarness {
    pub service: Arc<TurnService>,
    pub store: Arc<dyn TurnStore>,
    /// The in-memory backend, when not running on SQLite.
    pub memory: Option<Arc<MemoryStore>>,
    pub clock: Arc<FixedClock>,
    pub config: TurnosConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Staff assigned to service point 1.
    pub fn staff() -> Actor {
        Actor::staff(STAFF_ID)
    }

    pub fn admin() -> Actor {
        Actor::admin("admin")
    }

    /// Request a turn at `point` as citizen `who`.
    pub async fn request(
        &self,
        who: &str,
        point: i64,
        priority: PriorityClass,
    ) -> Result<Turn, TurnosError> {
        self.service
            .create_turn(
                &Actor::citizen(who),
                CreateTurnRequest::new(ServicePointId(point), priority, "general"),
            )
            .await
    }

    /// Move a turn as the staff member of service point 1.
    pub async fn move_to(&self, turn: &Turn, state: TurnState) -> Result<Turn, TurnosError> {
        self.service
            .transition_state(&Self::staff(), turn.id, state)
            .await
    }

    pub async fn reload(&self, id: TurnId) -> Result<Turn, TurnosError> {
        self.store
            .get_turn(id)
            .await?
            .ok_or_else(|| TurnosError::missing_turn(id))
    }
}
