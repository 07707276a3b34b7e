// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Draft tasks: one per session, latest write wins.

use rusqlite::{OptionalExtension, params};
use todobridge_core::BridgeError;

use crate::database::{Database, map_tr_err};
use crate::models::{DraftTask, SessionId, draft_from_row};

/// Insert or replace the draft of `draft.session_id`.
pub async fn save_draft(db: &Database, draft: &DraftTask) -> Result<(), BridgeError> {
    let draft = draft.clone();
    let labels = serde_json::to_string(&draft.labels).map_err(|e| BridgeError::Storage {
        source: Box::new(e),
    })?;
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO draft_tasks
                     (session_id, title, description, due_date, priority, assignee, labels, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(session_id) DO UPDATE SET
                     title = excluded.title,
                     description = excluded.description,
                     due_date = excluded.due_date,
                     priority = excluded.priority,
                     assignee = excluded.assignee,
                     labels = excluded.labels,
                     updated_at = excluded.updated_at",
                params![
                    draft.session_id.0,
                    draft.title,
                    draft.description,
                    draft.due_date,
                    draft.priority,
                    draft.assignee,
                    labels,
                    draft.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_draft(db: &Database, session_id: SessionId) -> Result<Option<DraftTask>, BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<DraftTask>> {
            conn.query_row(
                "SELECT session_id, title, description, due_date, priority, assignee, labels, updated_at
                 FROM draft_tasks WHERE session_id = ?1",
                params![session_id.0],
                draft_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_draft(db: &Database, session_id: SessionId) -> Result<(), BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "DELETE FROM draft_tasks WHERE session_id = ?1",
                params![session_id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
