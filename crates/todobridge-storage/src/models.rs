// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping for storage entities.
//!
//! The entity types live in `todobridge-core`; this module only knows how
//! to build them from SQLite rows.

use std::str::FromStr;

use rusqlite::Row;
use rusqlite::types::Type;

pub use todobridge_core::types::{
    AuditEdit, ChatId, CreatedTask, DraftTask, MessageId, Session, SessionId, SessionStatus,
    StoredMessage, UserId,
};

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Columns: id, chat_id, owner_id, status, started_at, closed_at.
pub(crate) fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let status: String = row.get(3)?;
    Ok(Session {
        id: SessionId(row.get(0)?),
        chat_id: ChatId(row.get(1)?),
        owner_id: row.get::<_, Option<i64>>(2)?.map(UserId),
        status: SessionStatus::from_str(&status).map_err(|e| conversion_err(3, e))?,
        started_at: row.get(4)?,
        closed_at: row.get(5)?,
    })
}

/// Columns: id, chat_id, session_id, message_id, user_id, username, text, captured_at.
pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        chat_id: ChatId(row.get(1)?),
        session_id: row.get::<_, Option<i64>>(2)?.map(SessionId),
        message_id: MessageId(row.get(3)?),
        user_id: row.get::<_, Option<i64>>(4)?.map(UserId),
        username: row.get(5)?,
        text: row.get(6)?,
        captured_at: row.get(7)?,
    })
}

/// Columns: session_id, title, description, due_date, priority, assignee, labels, updated_at.
pub(crate) fn draft_from_row(row: &Row<'_>) -> rusqlite::Result<DraftTask> {
    let labels: String = row.get(6)?;
    Ok(DraftTask {
        session_id: SessionId(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        due_date: row.get(3)?,
        priority: row.get(4)?,
        assignee: row.get(5)?,
        labels: serde_json::from_str(&labels).map_err(|e| conversion_err(6, e))?,
        updated_at: row.get(7)?,
    })
}

/// Columns: id, session_id, external_id, url, created_at.
pub(crate) fn created_task_from_row(row: &Row<'_>) -> rusqlite::Result<CreatedTask> {
    Ok(CreatedTask {
        id: row.get(0)?,
        session_id: SessionId(row.get(1)?),
        external_id: row.get(2)?,
        url: row.get(3)?,
        created_at: row.get(4)?,
    })
}
