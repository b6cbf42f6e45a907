// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across Herald crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A persisted message. `id` is assigned by storage and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
}

/// The text of the most recent message, recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeMessage {
    pub text: String,
}

/// Whether the process is a static build pass or a live server.
///
/// Resolved once at startup and passed explicitly to every component that
/// behaves differently without live infrastructure.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExecutionMode {
    /// Offline artifact compilation; no network or database access.
    Build,
    /// Normal request serving.
    #[default]
    Serving,
}

impl ExecutionMode {
    pub fn is_build(self) -> bool {
        self == Self::Build
    }
}

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the call may proceed.
    pub allowed: bool,
    /// Configured capacity of the window.
    pub limit: u32,
    /// Calls left in the current window after this one.
    pub remaining: u32,
    /// Seconds until the current window resets. Zero when allowed.
    pub retry_after_secs: u64,
}

impl RateLimitDecision {
    /// Decision used when rate limiting is disabled.
    pub fn unlimited() -> Self {
        Self {
            allowed: true,
            limit: u32::MAX,
            remaining: u32::MAX,
            retry_after_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn execution_mode_parses_lowercase() {
        assert_eq!(ExecutionMode::from_str("build").unwrap(), ExecutionMode::Build);
        assert_eq!(
            ExecutionMode::from_str("serving").unwrap(),
            ExecutionMode::Serving
        );
        assert!(ExecutionMode::from_str("staging").is_err());
        assert_eq!(ExecutionMode::Build.to_string(), "build");
    }

    #[test]
    fn execution_mode_defaults_to_serving() {
        assert_eq!(ExecutionMode::default(), ExecutionMode::Serving);
        assert!(!ExecutionMode::default().is_build());
    }

    #[test]
    fn message_serializes_as_plain_object() {
        let msg = Message {
            id: 2,
            text: "Second".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"id": 2, "text": "Second"}));
    }
}
