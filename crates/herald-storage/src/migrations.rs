// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations using refinery.
//!
//! The SQL files under `migrations/` are compiled into the binary and applied
//! whenever a [`Database`](crate::Database) is opened.

use herald_core::HeraldError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations.
///
/// Refinery records applied versions in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), HeraldError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| HeraldError::Storage { source: Box::new(e) })?;
    for migration in report.applied_migrations() {
        tracing::info!(migration = %migration, "applied migration");
    }
    Ok(())
}
