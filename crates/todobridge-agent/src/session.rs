// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discussion session lifecycle.
//!
//! The store is the only authority: nothing here caches session state
//! between calls.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use todobridge_core::error::BridgeError;
use todobridge_core::types::{ChatId, MessageId, Session, SessionId, StoredMessage, UserId};
use todobridge_core::{StorageAdapter, TaskTrackerAdapter};
use tracing::{debug, info};

/// `todoist.com/app/projects/<digits>` or the `<slug>-<digits>` form.
static PROJECT_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"todoist\.com/app/projects/(?:[\w-]*-)?(\d+)").ok());

/// Extracts a project id from a Todoist project URL, or takes the input as
/// a bare id.
pub fn parse_project_ref(project_ref: &str) -> Option<String> {
    let trimmed = project_ref.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(re) = PROJECT_URL.as_ref()
        && let Some(caps) = re.captures(trimmed)
    {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if trimmed.contains('/') || trimmed.chars().any(char::is_whitespace) {
        return None;
    }
    Some(trimmed.to_string())
}

/// Open/closed lifecycle per chat, ownership and message capture.
#[derive(Clone)]
pub struct SessionManager {
    storage: Arc<dyn StorageAdapter>,
    tracker: Arc<dyn TaskTrackerAdapter>,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn StorageAdapter>, tracker: Arc<dyn TaskTrackerAdapter>) -> Self {
        Self { storage, tracker }
    }

    pub async fn ensure_chat(&self, chat_id: ChatId) -> Result<(), BridgeError> {
        self.storage.ensure_chat(chat_id).await
    }

    /// Resolves `project_ref`, checks it against the tracker's current
    /// project list and stores it for the chat. Returns the project id.
    pub async fn set_project(&self, chat_id: ChatId, project_ref: &str) -> Result<String, BridgeError> {
        let project_id = parse_project_ref(project_ref)
            .ok_or_else(|| BridgeError::InvalidProject(project_ref.trim().to_string()))?;

        let projects = self.tracker.list_projects().await?;
        if !projects.iter().any(|p| p.id == project_id) {
            debug!(chat_id = %chat_id, project_id, "project not found in tracker");
            return Err(BridgeError::InvalidProject(project_id));
        }

        self.storage.set_project_id(chat_id, &project_id).await?;
        info!(chat_id = %chat_id, project_id, "project configured");
        Ok(project_id)
    }

    pub async fn project_id(&self, chat_id: ChatId) -> Result<Option<String>, BridgeError> {
        self.storage.get_project_id(chat_id).await
    }

    /// Opens a session owned by `owner_id`.
    pub async fn start(&self, chat_id: ChatId, owner_id: UserId) -> Result<SessionId, BridgeError> {
        let session_id = self.storage.start_session(chat_id, owner_id).await?;
        info!(chat_id = %chat_id, session_id = %session_id, owner_id = %owner_id, "session started");
        Ok(session_id)
    }

    pub async fn has_active(&self, chat_id: ChatId) -> Result<bool, BridgeError> {
        Ok(self.storage.active_session(chat_id).await?.is_some())
    }

    pub async fn active(&self, chat_id: ChatId) -> Result<Session, BridgeError> {
        self.storage
            .active_session(chat_id)
            .await?
            .ok_or(BridgeError::NoActiveSession)
    }

    pub async fn get(&self, session_id: SessionId) -> Result<Session, BridgeError> {
        self.storage
            .get_session(session_id)
            .await?
            .ok_or(BridgeError::SessionNotFound(session_id))
    }

    /// Strict owner check. A session without a recorded owner has none.
    pub async fn is_owner(&self, session_id: SessionId, user_id: UserId) -> Result<bool, BridgeError> {
        let session = self.get(session_id).await?;
        Ok(session.owner_id == Some(user_id))
    }

    /// Closes the chat's open session and returns it. A session closed
    /// concurrently reports [`BridgeError::NoActiveSession`].
    pub async fn close(&self, chat_id: ChatId) -> Result<Session, BridgeError> {
        let session = self.active(chat_id).await?;
        self.close_session(&session).await?;
        Ok(session)
    }

    /// Closes a specific session if it is still open.
    pub async fn close_session(&self, session: &Session) -> Result<(), BridgeError> {
        if !self.storage.close_session(session.id).await? {
            return Err(BridgeError::NoActiveSession);
        }
        info!(chat_id = %session.chat_id, session_id = %session.id, "session closed");
        Ok(())
    }

    /// Captures a message, attaching it to the session open right now.
    pub async fn save_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        user_id: Option<UserId>,
        username: Option<&str>,
        text: &str,
    ) -> Result<Option<SessionId>, BridgeError> {
        let attached = self
            .storage
            .save_message(chat_id, message_id, user_id, username, text)
            .await?;
        if let Some(session_id) = attached {
            debug!(chat_id = %chat_id, session_id = %session_id, "message captured");
        }
        Ok(attached)
    }

    pub async fn session_messages(&self, session_id: SessionId) -> Result<Vec<StoredMessage>, BridgeError> {
        self.storage.session_messages(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todobridge_test_utils::{MockTaskTracker, temp_storage};

    async fn manager() -> (SessionManager, Arc<MockTaskTracker>, tempfile::TempDir) {
        let (storage, dir) = temp_storage().await;
        let tracker = Arc::new(MockTaskTracker::with_projects(&[("2203306141", "Work")]));
        (SessionManager::new(storage, tracker.clone()), tracker, dir)
    }

    #[test]
    fn project_refs() {
        assert_eq!(parse_project_ref("2203306141").as_deref(), Some("2203306141"));
        assert_eq!(
            parse_project_ref("https://app.todoist.com/app/projects/2203306141").as_deref(),
            Some("2203306141")
        );
        assert_eq!(
            parse_project_ref("https://app.todoist.com/app/projects/team-backlog-2203306141").as_deref(),
            Some("2203306141")
        );
        assert_eq!(parse_project_ref("  "), None);
        assert_eq!(parse_project_ref("https://example.com/x"), None);
    }

    #[tokio::test]
    async fn set_project_validates_against_tracker() {
        let (sessions, _tracker, _dir) = manager().await;
        let chat = ChatId(1);

        let err = sessions.set_project(chat, "999").await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidProject(_)));
        assert_eq!(sessions.project_id(chat).await.unwrap(), None);

        let id = sessions
            .set_project(chat, "https://todoist.com/app/projects/work-2203306141")
            .await
            .unwrap();
        assert_eq!(id, "2203306141");
        assert_eq!(sessions.project_id(chat).await.unwrap().as_deref(), Some("2203306141"));
    }

    #[tokio::test]
    async fn owner_is_fixed_for_session_lifetime() {
        let (sessions, _tracker, _dir) = manager().await;
        let id = sessions.start(ChatId(123), UserId(456)).await.unwrap();

        assert!(sessions.is_owner(id, UserId(456)).await.unwrap());
        assert!(!sessions.is_owner(id, UserId(789)).await.unwrap());

        // Another user's failed start does not change ownership.
        let err = sessions.start(ChatId(123), UserId(789)).await.unwrap_err();
        assert!(matches!(err, BridgeError::SessionAlreadyExists));
        assert!(sessions.is_owner(id, UserId(456)).await.unwrap());
    }

    #[tokio::test]
    async fn is_owner_of_missing_session() {
        let (sessions, _tracker, _dir) = manager().await;
        let err = sessions.is_owner(SessionId(42), UserId(1)).await.unwrap_err();
        assert!(matches!(err, BridgeError::SessionNotFound(SessionId(42))));
    }

    #[tokio::test]
    async fn close_twice_reports_no_active_session() {
        let (sessions, _tracker, _dir) = manager().await;
        sessions.start(ChatId(5), UserId(1)).await.unwrap();
        assert!(sessions.has_active(ChatId(5)).await.unwrap());

        let closed = sessions.close(ChatId(5)).await.unwrap();
        assert!(!sessions.has_active(ChatId(5)).await.unwrap());
        assert!(matches!(
            sessions.close(ChatId(5)).await.unwrap_err(),
            BridgeError::NoActiveSession
        ));
        assert!(matches!(
            sessions.close_session(&closed).await.unwrap_err(),
            BridgeError::NoActiveSession
        ));
    }

    #[tokio::test]
    async fn messages_attach_only_while_open() {
        let (sessions, _tracker, _dir) = manager().await;
        let chat = ChatId(7);
        assert_eq!(
            sessions.save_message(chat, MessageId(1), Some(UserId(1)), Some("a"), "before").await.unwrap(),
            None
        );
        let id = sessions.start(chat, UserId(1)).await.unwrap();
        assert_eq!(
            sessions.save_message(chat, MessageId(2), Some(UserId(2)), None, "during").await.unwrap(),
            Some(id)
        );
        let texts: Vec<_> = sessions
            .session_messages(id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["during"]);
    }
}
