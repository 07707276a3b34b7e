// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message capture. Messages are append-only.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use todobridge_core::BridgeError;

use crate::database::{Database, map_tr_err};
use crate::models::{ChatId, MessageId, SessionId, StoredMessage, UserId, message_from_row};
use crate::queries::chats::ENSURE_CHAT_SQL;

/// Fields of a message to capture.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub text: String,
    pub captured_at: DateTime<Utc>,
}

/// Store a message, attaching it to whichever session is open in its chat
/// at this moment. Returns that session, if any.
///
/// User id `0` and blank usernames are stored as NULL.
pub async fn insert_message(
    db: &Database,
    message: NewMessage,
) -> Result<Option<SessionId>, BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<SessionId>> {
            let tx = conn.transaction()?;
            tx.execute(ENSURE_CHAT_SQL, params![message.chat_id.0, message.captured_at])?;

            let session_id: Option<i64> = tx
                .query_row(
                    "SELECT id FROM sessions WHERE chat_id = ?1 AND status = 'open'
                     ORDER BY started_at DESC, id DESC LIMIT 1",
                    params![message.chat_id.0],
                    |row| row.get(0),
                )
                .optional()?;

            let user_id = message.user_id.map(|u| u.0).filter(|id| *id != 0);
            let username = message.username.filter(|name| !name.trim().is_empty());

            tx.execute(
                "INSERT INTO messages
                     (chat_id, session_id, message_id, user_id, username, text, captured_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    message.chat_id.0,
                    session_id,
                    message.message_id.0,
                    user_id,
                    username,
                    message.text,
                    message.captured_at,
                ],
            )?;
            tx.commit()?;
            Ok(session_id.map(SessionId))
        })
        .await
        .map_err(map_tr_err)
}

/// Messages of a session in capture order; insertion order breaks ties.
pub async fn session_messages(
    db: &Database,
    session_id: SessionId,
) -> Result<Vec<StoredMessage>, BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<StoredMessage>> {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, session_id, message_id, user_id, username, text, captured_at
                 FROM messages WHERE session_id = ?1
                 ORDER BY captured_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![session_id.0], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
