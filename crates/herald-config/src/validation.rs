// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Collects every problem instead of stopping at the first one.

use herald_core::ExecutionMode;

use crate::diagnostic::ConfigError;
use crate::model::{DatabaseLocation, HeraldConfig, QuotaStoreLocation};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &HeraldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if config.server.host.trim().is_empty() {
        invalid("server.host must not be empty".to_string());
    }

    // A missing database_url is reported by the storage provider at first use;
    // a malformed one is caught here. Build passes never read it.
    if config.runtime.mode == ExecutionMode::Serving
        && let Some(url) = &config.storage.database_url
        && let Err(e) = url.parse::<DatabaseLocation>()
    {
        invalid(format!("storage.database_url: {e}"));
    }

    if let Err(e) = config.rate_limit.store_url.parse::<QuotaStoreLocation>() {
        invalid(format!("rate_limit.store_url: {e}"));
    }

    if config.rate_limit.max_requests == 0 {
        invalid("rate_limit.max_requests must be at least 1".to_string());
    }

    if config.rate_limit.window_secs == 0 {
        invalid("rate_limit.window_secs must be at least 1".to_string());
    }

    if config.rate_limit.prefix.trim().is_empty() {
        invalid("rate_limit.prefix must not be empty".to_string());
    }

    if config.welcome.build_text.is_empty() {
        invalid("welcome.build_text must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        invalid(format!(
            "log.level `{}` is not one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
