// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Draft revision audit trail.

use rusqlite::params;
use todobridge_core::BridgeError;

use crate::database::{Database, map_tr_err};
use crate::models::{AuditEdit, SessionId};

pub async fn save_audit_edit(db: &Database, edit: &AuditEdit) -> Result<(), BridgeError> {
    let edit = edit.clone();
    let diff = edit.diff.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO audit_edits (session_id, instruction, diff_json, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![edit.session_id.0, edit.instruction, diff, edit.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of recorded revisions for a session.
pub async fn count_audit_edits(db: &Database, session_id: SessionId) -> Result<i64, BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<i64> {
            conn.query_row(
                "SELECT COUNT(*) FROM audit_edits WHERE session_id = ?1",
                params![session_id.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
