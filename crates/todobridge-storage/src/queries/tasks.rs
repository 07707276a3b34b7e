// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log of tasks created in the tracker.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use todobridge_core::BridgeError;
use todobridge_core::types::CreatedTaskRef;

use crate::database::{Database, map_tr_err};
use crate::models::{CreatedTask, SessionId, created_task_from_row};

pub async fn save_created_task(
    db: &Database,
    session_id: SessionId,
    task: &CreatedTaskRef,
) -> Result<CreatedTask, BridgeError> {
    let task = task.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<CreatedTask> {
            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO created_tasks (session_id, external_id, url, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id.0, task.id, task.url, created_at],
            )?;
            Ok(CreatedTask {
                id: conn.last_insert_rowid(),
                session_id,
                external_id: task.id,
                url: task.url,
                created_at,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// The earliest task created from a session.
pub async fn created_task_for_session(
    db: &Database,
    session_id: SessionId,
) -> Result<Option<CreatedTask>, BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<CreatedTask>> {
            conn.query_row(
                "SELECT id, session_id, external_id, url, created_at
                 FROM created_tasks WHERE session_id = ?1
                 ORDER BY id ASC LIMIT 1",
                params![session_id.0],
                created_task_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
