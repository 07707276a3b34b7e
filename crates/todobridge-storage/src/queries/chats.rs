// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat rows and per-chat settings.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use todobridge_core::BridgeError;

use crate::database::{Database, map_tr_err};
use crate::models::ChatId;

pub(crate) const ENSURE_CHAT_SQL: &str =
    "INSERT INTO chats (chat_id, created_at) VALUES (?1, ?2) ON CONFLICT(chat_id) DO NOTHING";

/// Create the chat row if it does not exist yet.
pub async fn ensure_chat(db: &Database, chat_id: ChatId) -> Result<(), BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(ENSURE_CHAT_SQL, params![chat_id.0, Utc::now()])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Upsert the task-tracker project of a chat.
pub async fn set_project_id(
    db: &Database,
    chat_id: ChatId,
    project_id: &str,
) -> Result<(), BridgeError> {
    let project_id = project_id.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            let now = Utc::now();
            let tx = conn.transaction()?;
            tx.execute(ENSURE_CHAT_SQL, params![chat_id.0, now])?;
            tx.execute(
                "INSERT INTO chat_settings (chat_id, todoist_project_id, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     todoist_project_id = excluded.todoist_project_id,
                     updated_at = excluded.updated_at",
                params![chat_id.0, project_id, now],
            )?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// The configured project of a chat. An empty stored value counts as unset.
pub async fn get_project_id(db: &Database, chat_id: ChatId) -> Result<Option<String>, BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<String>> {
            let project: Option<Option<String>> = conn
                .query_row(
                    "SELECT todoist_project_id FROM chat_settings WHERE chat_id = ?1",
                    params![chat_id.0],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(project.flatten().filter(|p| !p.trim().is_empty()))
        })
        .await
        .map_err(map_tr_err)
}
