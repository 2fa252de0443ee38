// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as parseable timezones, ordered length bands, and
//! non-zero intervals.

use std::str::FromStr;

use crate::diagnostic::ConfigError;
use crate::model::CorvoConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CorvoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate log level
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    if !LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of trace, debug, info, warn, error; got `{}`",
                config.agent.log_level
            ),
        });
    }

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate aggregator delays are non-zero
    for (key, value) in [
        ("aggregator.short_delay_ms", config.aggregator.short_delay_ms),
        ("aggregator.medium_delay_ms", config.aggregator.medium_delay_ms),
        ("aggregator.long_delay_ms", config.aggregator.long_delay_ms),
        ("aggregator.typing_extension_ms", config.aggregator.typing_extension_ms),
        ("aggregator.album_window_ms", config.aggregator.album_window_ms),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than zero"),
            });
        }
    }

    // Validate length bands are ordered
    if config.aggregator.short_max_chars >= config.aggregator.medium_max_chars {
        errors.push(ConfigError::Validation {
            message: format!(
                "aggregator.short_max_chars ({}) must be less than aggregator.medium_max_chars ({})",
                config.aggregator.short_max_chars, config.aggregator.medium_max_chars
            ),
        });
    }

    // Validate dispatcher limits
    if config.dispatcher.history_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatcher.history_limit must be greater than zero".to_string(),
        });
    }
    if config.dispatcher.max_document_pages == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatcher.max_document_pages must be greater than zero".to_string(),
        });
    }

    // Validate worker intervals are non-zero
    for (key, value) in [
        ("delivery.poll_interval_ms", config.delivery.poll_interval_ms),
        ("broadcast.poll_interval_secs", config.broadcast.poll_interval_secs),
        ("scheduler.poll_interval_secs", config.scheduler.poll_interval_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than zero"),
            });
        }
    }

    // Validate the scheduler timezone parses as an IANA name
    if chrono_tz::Tz::from_str(&config.scheduler.timezone).is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "scheduler.timezone `{}` is not a valid IANA timezone name",
                config.scheduler.timezone
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = CorvoConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = CorvoConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_delay_fails_validation() {
        let mut config = CorvoConfig::default();
        config.aggregator.short_delay_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("short_delay_ms"))));
    }

    #[test]
    fn unordered_length_bands_fail_validation() {
        let mut config = CorvoConfig::default();
        config.aggregator.short_max_chars = 50;
        config.aggregator.medium_max_chars = 15;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("short_max_chars"))));
    }

    #[test]
    fn bogus_timezone_fails_validation() {
        let mut config = CorvoConfig::default();
        config.scheduler.timezone = "Mars/Olympus_Mons".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("timezone"))));
    }

    #[test]
    fn named_timezone_passes_validation() {
        let mut config = CorvoConfig::default();
        config.scheduler.timezone = "Europe/Berlin".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let mut config = CorvoConfig::default();
        config.agent.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))));
    }

    #[test]
    fn multiple_errors_are_collected() {
        let mut config = CorvoConfig::default();
        config.storage.database_path = "".to_string();
        config.scheduler.timezone = "nope".to_string();
        config.dispatcher.history_limit = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3, "expected all errors collected, got {}", errors.len());
    }
}
