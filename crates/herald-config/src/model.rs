// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Herald.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of silently falling back to a default.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use herald_core::ExecutionMode;
use serde::{Deserialize, Serialize};

/// Top-level Herald configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Relational store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Quota enforcement settings for mutating procedures.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Welcome message behavior.
    #[serde(default)]
    pub welcome: WelcomeConfig,

    /// Build-time vs. serving-time discriminator.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Relational store configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Connection descriptor, `sqlite://<path>` or `sqlite::memory:`.
    /// Required at serving time, ignored at build time.
    #[serde(default)]
    pub database_url: Option<String>,
}

/// Where the message database lives, parsed from `storage.database_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

impl FromStr for DatabaseLocation {
    type Err = String;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let url = url.trim();
        if url == "sqlite::memory:" || url == "sqlite://:memory:" {
            return Ok(Self::Memory);
        }
        match url.strip_prefix("sqlite://") {
            Some(path) if !path.trim().is_empty() => Ok(Self::File(PathBuf::from(path))),
            Some(_) => Err(format!("database url `{url}` has an empty path")),
            None => Err(format!(
                "database url `{url}` must start with `sqlite://` or be `sqlite::memory:`"
            )),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Quota store descriptor, `memory://` or `sqlite://<path>`.
    #[serde(default = "default_store_url")]
    pub store_url: String,

    /// Requests allowed per window per identifier.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Key prefix, so one quota store can be shared by several services.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            store_url: default_store_url(),
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            prefix: default_prefix(),
        }
    }
}

fn default_store_url() -> String {
    "memory://".to_string()
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    10
}

fn default_prefix() -> String {
    "@herald/ratelimit".to_string()
}

/// Where quota counters live, parsed from `rate_limit.store_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaStoreLocation {
    /// Counters held in process memory (single instance deployments).
    Memory,
    /// Counters held in a SQLite file that several processes can share.
    Sqlite(PathBuf),
}

impl FromStr for QuotaStoreLocation {
    type Err = String;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let url = url.trim();
        if url == "memory://" {
            return Ok(Self::Memory);
        }
        match url.strip_prefix("sqlite://") {
            Some(path) if !path.trim().is_empty() => Ok(Self::Sqlite(PathBuf::from(path))),
            _ => Err(format!(
                "quota store url `{url}` must be `memory://` or `sqlite://<path>`"
            )),
        }
    }
}

/// What `getWelcomeMessage` does when the store holds no messages.
///
/// Written in config as `"fail"` or `"fallback:<text>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum OnEmptyPolicy {
    #[default]
    Fail,
    Fallback(String),
}

impl FromStr for OnEmptyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "fail" {
            return Ok(Self::Fail);
        }
        match s.strip_prefix("fallback:") {
            Some(text) if !text.is_empty() => Ok(Self::Fallback(text.to_string())),
            Some(_) => Err("fallback text must not be empty".to_string()),
            None => Err(format!(
                "unknown on-empty policy `{s}`, expected `fail` or `fallback:<text>`"
            )),
        }
    }
}

impl TryFrom<String> for OnEmptyPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OnEmptyPolicy> for String {
    fn from(policy: OnEmptyPolicy) -> Self {
        policy.to_string()
    }
}

impl fmt::Display for OnEmptyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => f.write_str("fail"),
            Self::Fallback(text) => write!(f, "fallback:{text}"),
        }
    }
}

/// Welcome message configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WelcomeConfig {
    #[serde(default)]
    pub on_empty: OnEmptyPolicy,

    /// Text served by `getWelcomeMessage` during a build pass.
    #[serde(default = "default_build_text")]
    pub build_text: String,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            on_empty: OnEmptyPolicy::default(),
            build_text: default_build_text(),
        }
    }
}

fn default_build_text() -> String {
    "Hello, world!".to_string()
}

/// Execution mode configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub mode: ExecutionMode,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Level for the `herald*` targets (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
