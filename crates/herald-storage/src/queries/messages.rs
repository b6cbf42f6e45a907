// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message queries.

use herald_core::{HeraldError, Message};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        text: row.get(1)?,
    })
}

/// Insert a message and return it with its storage-assigned id.
pub async fn insert_message(db: &Database, text: &str) -> Result<Message, HeraldError> {
    let text = text.to_string();
    db.connection()
        .call(move |conn| -> Result<Message, rusqlite::Error> {
            conn.execute("INSERT INTO messages (text) VALUES (?1)", params![text])?;
            Ok(Message {
                id: conn.last_insert_rowid(),
                text,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// The message with the highest id, if any.
pub async fn latest_message(db: &Database) -> Result<Option<Message>, HeraldError> {
    db.connection()
        .call(|conn| -> Result<Option<Message>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, text FROM messages ORDER BY id DESC LIMIT 1",
                [],
                row_to_message,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All messages, newest first.
pub async fn list_messages(db: &Database) -> Result<Vec<Message>, HeraldError> {
    db.connection()
        .call(|conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT id, text FROM messages ORDER BY id DESC")?;
            let rows = stmt.query_map([], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every message. Returns the number of rows removed.
///
/// Only the seeding command uses this; the RPC layer never deletes.
pub async fn clear_messages(db: &Database) -> Result<usize, HeraldError> {
    db.connection()
        .call(|conn| -> Result<usize, rusqlite::Error> { conn.execute("DELETE FROM messages", []) })
        .await
        .map_err(map_tr_err)
}
