// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Herald.
//!
//! TOML files in the XDG hierarchy, `HERALD_*` environment overrides, strict
//! unknown-key rejection, and miette diagnostics for anything that fails.
//!
//! # Usage
//!
//! ```no_run
//! use herald_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{HeraldConfig, OnEmptyPolicy};

/// Load configuration and validate it.
///
/// With `path`, only that file (plus env overrides) is read; otherwise the
/// standard hierarchy is used.
pub fn load_and_validate(path: Option<&Path>) -> Result<HeraldConfig, Vec<ConfigError>> {
    let loaded = match path {
        Some(path) => loader::load_config_from_path(path),
        None => loader::load_config(),
    };
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = match path {
                Some(path) => read_sources(std::iter::once(path.to_path_buf())),
                None => read_sources(loader::config_paths()),
            };
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<HeraldConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read config files that exist, keyed by the path Figment reports for them.
fn read_sources(paths: impl IntoIterator<Item = std::path::PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let absolute = std::path::absolute(&path).unwrap_or(path);
            Some((absolute.display().to_string(), content))
        })
        .collect()
}
