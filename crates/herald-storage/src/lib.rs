// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Herald.
//!
//! WAL-mode SQLite with embedded migrations, a single-writer connection via
//! `tokio-rusqlite`, message queries, and the [`StorageProvider`] that owns
//! the process-wide handle.

pub mod database;
pub mod migrations;
pub mod provider;
pub mod queries;

pub use database::Database;
pub use provider::{StorageHandle, StorageProvider};
