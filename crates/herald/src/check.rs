// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald check` command implementation.
//!
//! Prints every stored message, newest first.

use herald_config::HeraldConfig;
use herald_core::{ExecutionMode, HeraldError, Message};
use herald_storage::queries::messages;
use herald_storage::{StorageHandle, StorageProvider};

use crate::serve::init_tracing;

pub async fn run_check(config: HeraldConfig) -> Result<(), HeraldError> {
    init_tracing(&config.log.level);

    let provider = StorageProvider::new(ExecutionMode::Serving, &config.storage);
    let StorageHandle::Live(db) = provider.handle().await? else {
        return Err(HeraldError::Config("storage is offline".to_string()));
    };
    let all = messages::list_messages(&db).await?;
    print!("{}", format_messages(&all));

    drop(db);
    provider.close().await
}

fn format_messages(all: &[Message]) -> String {
    if all.is_empty() {
        return "No messages found.\n".to_string();
    }
    let mut out = format!("{} message(s):\n", all.len());
    for message in all {
        out.push_str(&format!("  #{}: {}\n", message.id, message.text));
    }
    out
}
