// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald seed` command implementation.

use herald_config::HeraldConfig;
use herald_core::{ExecutionMode, HeraldError, Message};
use herald_storage::queries::messages;
use herald_storage::{Database, StorageHandle, StorageProvider};
use tracing::info;

use crate::serve::init_tracing;

pub const SEED_TEXT: &str = "Hello, world!";

pub async fn run_seed(config: HeraldConfig) -> Result<(), HeraldError> {
    init_tracing(&config.log.level);

    // Seeding always needs the real database, whatever the configured mode.
    let provider = StorageProvider::new(ExecutionMode::Serving, &config.storage);
    let StorageHandle::Live(db) = provider.handle().await? else {
        return Err(HeraldError::Config("storage is offline".to_string()));
    };

    let (removed, seeded) = seed(&db).await?;
    println!("Removed {removed} existing message(s).");
    println!("Inserted message #{}: {}", seeded.id, seeded.text);

    drop(db);
    provider.close().await
}

/// Replace all messages with the single default welcome message.
pub(crate) async fn seed(db: &Database) -> Result<(usize, Message), HeraldError> {
    let removed = messages::clear_messages(db).await?;
    let seeded = messages::insert_message(db, SEED_TEXT).await?;
    info!(removed, id = seeded.id, "database seeded");
    Ok((removed, seeded))
}
