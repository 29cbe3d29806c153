// SPDX-FileCopyrightText: 2026 Turnos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as offset ranges, well-formed time windows, and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::TurnosConfig;

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TurnosConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    let offset = config.service.utc_offset_minutes;
    if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&offset) {
        invalid(format!(
            "service.utc_offset_minutes must be within ±{MAX_OFFSET_MINUTES}, got {offset}"
        ));
    }

    if config.service.minutes_per_turn == 0 {
        invalid("service.minutes_per_turn must be at least 1".to_string());
    }

    for (i, window) in config.service.allowed_windows.iter().enumerate() {
        if window.start_hour >= window.end_hour || window.end_hour > 24 {
            invalid(format!(
                "service.allowed_windows[{i}] must satisfy start_hour < end_hour <= 24, got {}..{}",
                window.start_hour, window.end_hour
            ));
        }
    }

    let windows = &config.service.allowed_windows;
    for (i, a) in windows.iter().enumerate() {
        for (j, b) in windows.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                invalid(format!(
                    "service.allowed_windows[{i}] and service.allowed_windows[{j}] overlap"
                ));
            }
        }
    }

    if config.allocator.max_attempts == 0 {
        invalid("allocator.max_attempts must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        invalid("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            invalid(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        invalid("gateway.bearer_token must not be blank when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
