// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle queries.
//!
//! The partial unique index `idx_sessions_one_open_per_chat` is the final
//! word on "one open session per chat": the explicit check in
//! [`start_session`] gives the common case a clean answer, and a unique
//! violation from a racing writer on another connection is reported the
//! same way.

use chrono::Utc;
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use todobridge_core::BridgeError;

use crate::database::{Database, map_tr_err};
use crate::models::{ChatId, Session, SessionId, UserId, session_from_row};
use crate::queries::chats::ENSURE_CHAT_SQL;

const SESSION_COLUMNS: &str = "id, chat_id, owner_id, status, started_at, closed_at";

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Open a session owned by `owner_id`.
pub async fn start_session(
    db: &Database,
    chat_id: ChatId,
    owner_id: UserId,
) -> Result<SessionId, BridgeError> {
    let inserted = db
        .connection()
        .call(move |conn| -> rusqlite::Result<Option<i64>> {
            let now = Utc::now();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(ENSURE_CHAT_SQL, params![chat_id.0, now])?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM sessions WHERE chat_id = ?1 AND status = 'open'",
                    params![chat_id.0],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(None);
            }

            match tx.execute(
                "INSERT INTO sessions (chat_id, owner_id, status, started_at)
                 VALUES (?1, ?2, 'open', ?3)",
                params![chat_id.0, owner_id.0, now],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(None),
                Err(e) => return Err(e),
            }
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Some(id))
        })
        .await
        .map_err(map_tr_err)?;

    inserted
        .map(SessionId)
        .ok_or(BridgeError::SessionAlreadyExists)
}

/// The open session of a chat, most recent first if the invariant was
/// ever violated by an external writer.
pub async fn active_session(db: &Database, chat_id: ChatId) -> Result<Option<Session>, BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<Session>> {
            conn.query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE chat_id = ?1 AND status = 'open'
                     ORDER BY started_at DESC, id DESC LIMIT 1"
                ),
                params![chat_id.0],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_session(db: &Database, session_id: SessionId) -> Result<Option<Session>, BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<Session>> {
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![session_id.0],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Close a session if it is still open. Returns `false` when it was
/// already closed (or never existed), so concurrent closes are harmless.
pub async fn close_session(db: &Database, session_id: SessionId) -> Result<bool, BridgeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let changed = conn.execute(
                "UPDATE sessions SET status = 'closed', closed_at = ?2
                 WHERE id = ?1 AND status = 'open'",
                params![session_id.0, Utc::now()],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_temp;
    use crate::models::SessionStatus;

    #[tokio::test]
    async fn start_then_read_back() {
        let (db, _dir) = open_temp().await;
        let id = start_session(&db, ChatId(123), UserId(456)).await.unwrap();

        let session = active_session(&db, ChatId(123)).await.unwrap().unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.owner_id, Some(UserId(456)));
        assert_eq!(session.status, SessionStatus::Open);
        assert!(session.closed_at.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let (db, _dir) = open_temp().await;
        start_session(&db, ChatId(1), UserId(1)).await.unwrap();
        let err = start_session(&db, ChatId(1), UserId(2)).await.unwrap_err();
        assert!(matches!(err, BridgeError::SessionAlreadyExists));

        // Other chats are unaffected.
        start_session(&db, ChatId(2), UserId(2)).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_is_idempotent_and_new_session_gets_new_id() {
        let (db, _dir) = open_temp().await;
        let first = start_session(&db, ChatId(9), UserId(1)).await.unwrap();

        assert!(close_session(&db, first).await.unwrap());
        assert!(!close_session(&db, first).await.unwrap());
        assert!(active_session(&db, ChatId(9)).await.unwrap().is_none());

        let closed = get_session(&db, first).await.unwrap().unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);
        assert!(closed.closed_at.is_some());

        let second = start_session(&db, ChatId(9), UserId(1)).await.unwrap();
        assert_ne!(first, second);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unique_index_rejects_raw_second_open_row() {
        let (db, _dir) = open_temp().await;
        start_session(&db, ChatId(5), UserId(1)).await.unwrap();

        let result = db
            .connection()
            .call(|conn| -> rusqlite::Result<usize> {
                conn.execute(
                    "INSERT INTO sessions (chat_id, owner_id, status, started_at)
                     VALUES (5, 2, 'open', '2026-01-01 00:00:00+00:00')",
                    [],
                )
            })
            .await;
        assert!(result.is_err());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_starts_across_connections_yield_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.db");
        let path = path.to_str().unwrap();
        let a = Database::open(path).await.unwrap();
        let b = Database::open(path).await.unwrap();

        let attempts = (0..16).map(|i| {
            let db = if i % 2 == 0 { a.clone() } else { b.clone() };
            tokio::spawn(async move { start_session(&db, ChatId(77), UserId(i)).await })
        });
        let results = futures::future::join_all(attempts).await;

        let mut wins = 0;
        let mut already = 0;
        for result in results {
            match result.unwrap() {
                Ok(_) => wins += 1,
                Err(BridgeError::SessionAlreadyExists) => already += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(already, 15);

        a.close().await.unwrap();
        b.close().await.unwrap();
    }
}
