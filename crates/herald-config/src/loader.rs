// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./herald.toml` > `~/.config/herald/herald.toml` >
//! `/etc/herald/herald.toml`, with `HERALD_*` environment variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HeraldConfig;

/// Config file name searched for in each hierarchy directory.
pub const CONFIG_FILE_NAME: &str = "herald.toml";

/// Top-level sections, used to turn `HERALD_RATE_LIMIT_MAX_REQUESTS` into
/// `rate_limit.max_requests`.
const SECTIONS: &[&str] = &["server", "storage", "rate_limit", "welcome", "runtime", "log"];

/// Paths of the standard config hierarchy, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/herald").join(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("herald").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}

/// Build the Figment for the standard hierarchy plus env overrides.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(HeraldConfig::default()));
    for path in config_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<HeraldConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Map `HERALD_<SECTION>_<KEY>` onto `<section>.<key>`.
///
/// Section names may themselves contain underscores, so the split happens at
/// the first known section prefix rather than at every underscore.
fn env_provider() -> Env {
    Env::prefixed("HERALD_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key_str)
            .into()
    })
}
