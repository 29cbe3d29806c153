// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service point registry trait.

use async_trait::async_trait;

use crate::error::TurnosError;
use crate::traits::adapter::Adapter;
use crate::types::{ServicePoint, ServicePointId};

/// Lookup of service points, their activity flag, assigned staff, and
/// offered services. Maintained outside the queue engine.
#[async_trait]
pub trait ServicePointRegistry: Adapter {
    async fn get_service_point(
        &self,
        id: ServicePointId,
    ) -> Result<Option<ServicePoint>, TurnosError>;

    /// All service points, active or not, ordered by id.
    async fn list_service_points(&self) -> Result<Vec<ServicePoint>, TurnosError>;
}
