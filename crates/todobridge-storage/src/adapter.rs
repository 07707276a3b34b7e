// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::debug;

use todobridge_config::model::StorageConfig;
use todobridge_core::types::{
    AuditEdit, ChatId, CreatedTask, CreatedTaskRef, DraftTask, MessageId, Session, SessionId,
    StoredMessage, UserId,
};
use todobridge_core::{AdapterType, BridgeError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;
use crate::queries::messages::NewMessage;

/// SQLite-backed storage adapter.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, BridgeError> {
        self.db.get().ok_or_else(|| BridgeError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), BridgeError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), BridgeError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| BridgeError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), BridgeError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn ensure_chat(&self, chat_id: ChatId) -> Result<(), BridgeError> {
        queries::chats::ensure_chat(self.db()?, chat_id).await
    }

    async fn set_project_id(&self, chat_id: ChatId, project_id: &str) -> Result<(), BridgeError> {
        queries::chats::set_project_id(self.db()?, chat_id, project_id).await
    }

    async fn get_project_id(&self, chat_id: ChatId) -> Result<Option<String>, BridgeError> {
        queries::chats::get_project_id(self.db()?, chat_id).await
    }

    async fn start_session(
        &self,
        chat_id: ChatId,
        owner_id: UserId,
    ) -> Result<SessionId, BridgeError> {
        queries::sessions::start_session(self.db()?, chat_id, owner_id).await
    }

    async fn active_session(&self, chat_id: ChatId) -> Result<Option<Session>, BridgeError> {
        queries::sessions::active_session(self.db()?, chat_id).await
    }

    async fn get_session(&self, session_id: SessionId) -> Result<Option<Session>, BridgeError> {
        queries::sessions::get_session(self.db()?, session_id).await
    }

    async fn close_session(&self, session_id: SessionId) -> Result<bool, BridgeError> {
        queries::sessions::close_session(self.db()?, session_id).await
    }

    async fn save_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        user_id: Option<UserId>,
        username: Option<&str>,
        text: &str,
    ) -> Result<Option<SessionId>, BridgeError> {
        let message = NewMessage {
            chat_id,
            message_id,
            user_id,
            username: username.map(str::to_string),
            text: text.to_string(),
            captured_at: Utc::now(),
        };
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn session_messages(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<StoredMessage>, BridgeError> {
        queries::messages::session_messages(self.db()?, session_id).await
    }

    async fn save_draft(&self, draft: &DraftTask) -> Result<(), BridgeError> {
        queries::drafts::save_draft(self.db()?, draft).await
    }

    async fn get_draft(&self, session_id: SessionId) -> Result<Option<DraftTask>, BridgeError> {
        queries::drafts::get_draft(self.db()?, session_id).await
    }

    async fn delete_draft(&self, session_id: SessionId) -> Result<(), BridgeError> {
        queries::drafts::delete_draft(self.db()?, session_id).await
    }

    async fn save_created_task(
        &self,
        session_id: SessionId,
        task: &CreatedTaskRef,
    ) -> Result<CreatedTask, BridgeError> {
        queries::tasks::save_created_task(self.db()?, session_id, task).await
    }

    async fn created_task_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<CreatedTask>, BridgeError> {
        queries::tasks::created_task_for_session(self.db()?, session_id).await
    }

    async fn save_audit_edit(&self, edit: &AuditEdit) -> Result<(), BridgeError> {
        queries::audit::save_audit_edit(self.db()?, edit).await
    }

    async fn count_audit_edits(&self, session_id: SessionId) -> Result<i64, BridgeError> {
        queries::audit::count_audit_edits(self.db()?, session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn identifies_as_storage_adapter() {
        let storage = SqliteStorage::new(make_config("unused.db"));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn calls_before_initialize_fail() {
        let storage = SqliteStorage::new(make_config("unused.db"));
        let err = storage.ensure_chat(ChatId(1)).await.unwrap_err();
        assert!(matches!(err, BridgeError::Storage { .. }));
    }

    #[tokio::test]
    async fn double_initialize_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("double.db");
        let storage = SqliteStorage::new(make_config(path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn full_discussion_through_adapter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("adapter.db");
        let storage = SqliteStorage::new(make_config(path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);

        let chat = ChatId(123);
        let session = storage.start_session(chat, UserId(456)).await.unwrap();
        for (i, text) in ["one", "two", "three"].into_iter().enumerate() {
            let attached = storage
                .save_message(chat, MessageId(i as i32 + 1), Some(UserId(456)), Some("bob"), text)
                .await
                .unwrap();
            assert_eq!(attached, Some(session));
        }

        let messages = storage.session_messages(session).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].text, "one");

        assert!(storage.close_session(session).await.unwrap());
        assert!(storage.active_session(chat).await.unwrap().is_none());

        storage.close().await.unwrap();
        storage.shutdown().await.unwrap();
    }
}
