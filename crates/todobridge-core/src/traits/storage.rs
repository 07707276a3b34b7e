// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for durable discussion state.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AuditEdit, ChatId, CreatedTask, CreatedTaskRef, DraftTask, MessageId, Session, SessionId,
    StoredMessage, UserId,
};

/// Adapter for the relational store that owns every durable entity.
///
/// "Not found" is always reported as `Ok(None)` or `Ok(false)`, never as an
/// error, so callers can tell an absent row from a failing backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (opens the database, runs migrations).
    async fn initialize(&self) -> Result<(), BridgeError>;

    /// Closes the storage backend, flushing any pending writes.
    async fn close(&self) -> Result<(), BridgeError>;

    // --- Chats ---

    /// Creates the chat row if it is missing.
    async fn ensure_chat(&self, chat_id: ChatId) -> Result<(), BridgeError>;

    /// Upserts the tracker project configured for a chat.
    async fn set_project_id(&self, chat_id: ChatId, project_id: &str) -> Result<(), BridgeError>;

    /// Returns the configured project, treating an empty value as unset.
    async fn get_project_id(&self, chat_id: ChatId) -> Result<Option<String>, BridgeError>;

    // --- Sessions ---

    /// Opens a new session for the chat.
    ///
    /// Fails with [`BridgeError::SessionAlreadyExists`] when one is already
    /// open, including when a concurrent call won the race.
    async fn start_session(
        &self,
        chat_id: ChatId,
        owner_id: UserId,
    ) -> Result<SessionId, BridgeError>;

    /// Returns the open session of a chat.
    async fn active_session(&self, chat_id: ChatId) -> Result<Option<Session>, BridgeError>;

    async fn get_session(&self, session_id: SessionId) -> Result<Option<Session>, BridgeError>;

    /// Closes a session if it is still open. Returns whether this call
    /// performed the transition.
    async fn close_session(&self, session_id: SessionId) -> Result<bool, BridgeError>;

    // --- Messages ---

    /// Appends a message, attaching it to the chat's open session if any.
    /// Returns the session the message was attached to.
    async fn save_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        user_id: Option<UserId>,
        username: Option<&str>,
        text: &str,
    ) -> Result<Option<SessionId>, BridgeError>;

    /// Messages of a session in capture order.
    async fn session_messages(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<StoredMessage>, BridgeError>;

    // --- Drafts ---

    /// Writes the draft for its session, replacing any previous one.
    async fn save_draft(&self, draft: &DraftTask) -> Result<(), BridgeError>;

    async fn get_draft(&self, session_id: SessionId) -> Result<Option<DraftTask>, BridgeError>;

    async fn delete_draft(&self, session_id: SessionId) -> Result<(), BridgeError>;

    // --- Created tasks and audit ---

    async fn save_created_task(
        &self,
        session_id: SessionId,
        task: &CreatedTaskRef,
    ) -> Result<CreatedTask, BridgeError>;

    /// The first task created from a session, if any.
    async fn created_task_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<CreatedTask>, BridgeError>;

    async fn save_audit_edit(&self, edit: &AuditEdit) -> Result<(), BridgeError>;

    /// Number of revisions recorded for a session.
    async fn count_audit_edits(&self, session_id: SessionId) -> Result<i64, BridgeError>;
}
