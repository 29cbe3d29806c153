// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `turnos serve` command implementation.
//!
//! Opens SQLite storage, builds the `TurnService` over it with the system
//! clock in the configured zone, and serves the HTTP API until SIGINT or
//! SIGTERM.

use std::sync::Arc;

use tracing::{info, warn};
use turnos_config::TurnosConfig;
use turnos_core::{Adapter, TurnosError};
use turnos_engine::{SystemClock, TurnService, recording};
use turnos_gateway::{GatewayState, ServerConfig, start_server};
use turnos_storage::SqliteStorage;

/// Open and migrate the configured database.
pub async fn open_storage(config: &TurnosConfig) -> Result<Arc<SqliteStorage>, TurnosError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Wire the queue engine over `storage`.
pub fn build_service(
    config: &TurnosConfig,
    storage: &Arc<SqliteStorage>,
) -> Result<TurnService, TurnosError> {
    let clock = Arc::new(SystemClock::from_config(&config.service)?);
    Ok(TurnService::new(
        storage.clone(),
        storage.clone(),
        clock,
        config,
    ))
}

/// Runs the `turnos serve` command.
pub async fn run_serve(config: TurnosConfig) -> Result<(), TurnosError> {
    init_tracing(&config.service.log_level);

    info!("starting turnos serve");
    recording::register_metrics();

    let storage = open_storage(&config).await?;
    let service = Arc::new(build_service(&config, &storage)?);

    let server_config = ServerConfig::from(&config.gateway);
    if server_config.bearer_token.is_none() {
        warn!("gateway has no bearer token configured -- actor headers are trusted as sent");
    }
    let state = GatewayState::new(service, server_config.auth());

    start_server(&server_config, state, shutdown_signal()).await?;

    storage.shutdown().await?;
    info!("turnos serve shutdown complete");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        _ = terminate => info!("received SIGTERM, initiating shutdown"),
    }
}

/// Initialize the tracing subscriber with an env filter.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("turnos={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
