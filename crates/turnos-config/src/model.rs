// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Turnos queue system.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Top-level Turnos configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TurnosConfig {
    /// Local time zone, logging, and creation policy.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Ticket number allocation settings.
    #[serde(default)]
    pub allocator: AllocatorConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service-wide behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Fixed offset of the local zone from UTC, in minutes. Day boundaries
    /// are computed in this zone.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    /// Estimated minutes of service per waiting turn, for wait estimates.
    #[serde(default = "default_minutes_per_turn")]
    pub minutes_per_turn: u32,

    /// Hours during which turns may be requested. Empty means the whole day.
    #[serde(default)]
    pub allowed_windows: Vec<TimeWindow>,
}

impl ServiceConfig {
    /// The configured zone, or `None` if the offset is out of range.
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            utc_offset_minutes: default_utc_offset_minutes(),
            minutes_per_turn: default_minutes_per_turn(),
            allowed_windows: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_utc_offset_minutes() -> i32 {
    // America/Bogota, no daylight saving.
    -300
}

fn default_minutes_per_turn() -> u32 {
    10
}

/// A half-open range of local hours, `[start_hour, end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimeWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start_hour < other.end_hour && other.start_hour < self.end_hour
    }
}

/// Ticket number allocation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AllocatorConfig {
    /// How many times a conflicting allocation is retried before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Highest sequence allowed per scope and day. 0 disables the cap, in
    /// which case numbers past 999 grow a fourth digit.
    #[serde(default)]
    pub max_sequence: u32,
}

impl AllocatorConfig {
    pub fn sequence_limit(&self) -> Option<u32> {
        (self.max_sequence > 0).then_some(self.max_sequence)
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_sequence: 0,
        }
    }
}

fn default_max_attempts() -> u32 {
    8
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("turnos").join("turnos.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "turnos.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on `/v1` routes. `None` leaves them open,
    /// relying on the actor headers set by an upstream proxy.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_offset_is_bogota() {
        let offset = ServiceConfig::default().offset().unwrap();
        assert_eq!(offset.local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn out_of_range_offset_is_none() {
        let config = ServiceConfig {
            utc_offset_minutes: 24 * 60,
            ..ServiceConfig::default()
        };
        assert!(config.offset().is_none());
    }

    #[test]
    fn window_is_half_open() {
        let morning = TimeWindow::new(8, 12);
        assert!(!morning.contains(7));
        assert!(morning.contains(8));
        assert!(morning.contains(11));
        assert!(!morning.contains(12));
    }

    #[test]
    fn window_overlap() {
        assert!(TimeWindow::new(8, 12).overlaps(&TimeWindow::new(11, 13)));
        assert!(!TimeWindow::new(8, 12).overlaps(&TimeWindow::new(12, 16)));
    }

    #[test]
    fn zero_max_sequence_means_unbounded() {
        assert_eq!(AllocatorConfig::default().sequence_limit(), None);
        let capped = AllocatorConfig {
            max_sequence: 999,
            ..AllocatorConfig::default()
        };
        assert_eq!(capped.sequence_limit(), Some(999));
    }

    #[test]
    fn gateway_debug_redacts_token() {
        let config = GatewayConfig {
            bearer_token: Some("secret-token".into()),
            ..GatewayConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[redacted]"));
    }
}
