// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./turnos.toml` > `~/.config/turnos/turnos.toml` > `/etc/turnos/turnos.toml`
//! with environment variable overrides via `TURNOS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TurnosConfig;

const SYSTEM_CONFIG: &str = "/etc/turnos/turnos.toml";
const LOCAL_CONFIG: &str = "turnos.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/turnos/turnos.toml` (system-wide)
/// 3. `~/.config/turnos/turnos.toml` (user XDG config)
/// 4. `./turnos.toml` (local directory)
/// 5. `TURNOS_*` environment variables
pub fn load_config() -> Result<TurnosConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TurnosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TurnosConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TurnosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TurnosConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TurnosConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("turnos").join(LOCAL_CONFIG))
}

pub(crate) fn candidate_paths() -> Vec<std::path::PathBuf> {
    let mut paths = vec![std::path::PathBuf::from(SYSTEM_CONFIG)];
    paths.extend(user_config_path());
    paths.push(std::path::PathBuf::from(LOCAL_CONFIG));
    paths
}

/// Environment variable provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TURNOS_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("TURNOS_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["service", "allocator", "storage", "gateway"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
