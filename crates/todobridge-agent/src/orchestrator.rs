// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a discussion into a draft task and applies revisions to it.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Map, Value, json};
use todobridge_core::error::BridgeError;
use todobridge_core::types::{
    AnalyzedTask, AuditEdit, ChatId, DraftTask, OutboundMessage, SessionId, StoredMessage, UserId,
};
use todobridge_core::{AnalysisAdapter, StorageAdapter};
use tracing::{debug, info, warn};

use crate::assignee::extract_assignee;
use crate::dates::{convert_to_due_iso, today_in};
use crate::render;
use crate::session::SessionManager;

const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Formats one captured message for the analysis prompt.
pub fn format_message_line(message: &StoredMessage, offset: FixedOffset) -> String {
    let author = message
        .username
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNKNOWN_AUTHOR);
    let at = message.captured_at.with_timezone(&offset);
    format!("{author}, [{}]: {}", at.format("%Y-%m-%d %H:%M:%S"), message.text)
}

pub struct Orchestrator {
    sessions: SessionManager,
    storage: Arc<dyn StorageAdapter>,
    analyzer: Arc<dyn AnalysisAdapter>,
    offset: FixedOffset,
}

impl Orchestrator {
    pub fn new(
        sessions: SessionManager,
        storage: Arc<dyn StorageAdapter>,
        analyzer: Arc<dyn AnalysisAdapter>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            sessions,
            storage,
            analyzer,
            offset,
        }
    }

    /// Analyzes the chat's open discussion, stores the draft and returns the
    /// preview with its confirmation control.
    pub async fn create_task_from_discussion(
        &self,
        chat_id: ChatId,
        requesting_user: UserId,
    ) -> Result<OutboundMessage, BridgeError> {
        self.create_task_at(chat_id, requesting_user, Utc::now()).await
    }

    async fn create_task_at(
        &self,
        chat_id: ChatId,
        requesting_user: UserId,
        now: DateTime<Utc>,
    ) -> Result<OutboundMessage, BridgeError> {
        let session = self.sessions.active(chat_id).await?;
        if session.owner_id != Some(requesting_user) {
            return Err(BridgeError::NotOwner);
        }

        let messages = self.sessions.session_messages(session.id).await?;
        let lines: Vec<String> = messages
            .iter()
            .filter(|m| !m.text.trim().is_empty())
            .map(|m| format_message_line(m, self.offset))
            .collect();
        if lines.is_empty() {
            return Err(BridgeError::EmptyDiscussion);
        }
        if self.sessions.project_id(chat_id).await?.is_none() {
            return Err(BridgeError::ProjectNotSet);
        }

        debug!(chat_id = %chat_id, session_id = %session.id, lines = lines.len(), "analyzing discussion");
        let analyzed = self.analyzer.analyze(&lines).await?;

        let title = if analyzed.title.trim().is_empty() {
            fallback_title(&messages).ok_or_else(|| BridgeError::Analysis {
                message: "analysis returned an empty title and the discussion has no text".into(),
                source: None,
            })?
        } else {
            analyzed.title.trim().to_string()
        };

        let today = today_in(self.offset, now);
        let due_date = analyzed
            .due_date
            .as_deref()
            .map(|due| convert_to_due_iso(due, today))
            .filter(|due| !due.is_empty());

        let draft = DraftTask {
            session_id: session.id,
            title,
            description: analyzed.description,
            due_date,
            priority: Some(analyzed.priority),
            assignee: extract_assignee(&lines.join("\n")),
            labels: analyzed.labels,
            updated_at: now,
        };
        self.storage.save_draft(&draft).await?;
        info!(chat_id = %chat_id, session_id = %session.id, "draft stored");

        Ok(render::draft_preview(chat_id, &draft))
    }

    /// Applies free-text feedback to a session's draft and returns the
    /// updated preview.
    pub async fn revise(
        &self,
        session_id: SessionId,
        feedback: &str,
    ) -> Result<OutboundMessage, BridgeError> {
        let session = self.sessions.get(session_id).await?;
        if !session.is_open() {
            return Err(BridgeError::StaleSession(session_id));
        }
        let current = self
            .storage
            .get_draft(session_id)
            .await?
            .ok_or(BridgeError::DraftNotFound(session_id))?;

        let revised = self.analyzer.revise(&current.to_analyzed(), feedback).await?;
        let updated = apply_revision(&current, revised, today_in(self.offset, Utc::now()));
        self.storage.save_draft(&updated).await?;
        info!(chat_id = %session.chat_id, session_id = %session_id, "draft revised");

        let edit = AuditEdit {
            session_id,
            instruction: feedback.to_string(),
            diff: draft_diff(&current, &updated),
            created_at: Utc::now(),
        };
        if let Err(e) = self.storage.save_audit_edit(&edit).await {
            warn!(session_id = %session_id, error = %e, "failed to record audit edit");
        }

        Ok(render::revised_preview(session.chat_id, &updated))
    }
}

/// First non-empty message text, in capture order.
fn fallback_title(messages: &[StoredMessage]) -> Option<String> {
    messages
        .iter()
        .map(|m| m.text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Merges a revision into a draft. The assignee note is not part of the
/// model's view of the task, so it carries over.
fn apply_revision(current: &DraftTask, revised: AnalyzedTask, today: chrono::NaiveDate) -> DraftTask {
    let title = if revised.title.trim().is_empty() {
        current.title.clone()
    } else {
        revised.title.trim().to_string()
    };
    DraftTask {
        session_id: current.session_id,
        title,
        description: revised.description,
        due_date: revised
            .due_date
            .as_deref()
            .map(|due| convert_to_due_iso(due, today))
            .filter(|due| !due.is_empty()),
        priority: Some(revised.priority),
        assignee: current.assignee.clone(),
        labels: revised.labels,
        updated_at: Utc::now(),
    }
}

/// `{field: {from, to}}` for every field that changed.
fn draft_diff(before: &DraftTask, after: &DraftTask) -> Value {
    let mut diff = Map::new();
    let mut field = |name: &str, from: Value, to: Value| {
        if from != to {
            diff.insert(name.to_string(), json!({ "from": from, "to": to }));
        }
    };
    field("title", json!(before.title), json!(after.title));
    field("description", json!(before.description), json!(after.description));
    field("due_date", json!(before.due_date), json!(after.due_date));
    field("priority", json!(before.priority), json!(after.priority));
    field("labels", json!(before.labels), json!(after.labels));
    Value::Object(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use todobridge_core::types::MessageId;
    use todobridge_test_utils::{MockAnalyzer, MockTaskTracker, temp_storage};

    use crate::dates::reference_offset;

    struct Fixture {
        orchestrator: Orchestrator,
        sessions: SessionManager,
        storage: Arc<dyn StorageAdapter>,
        analyzer: Arc<MockAnalyzer>,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let (storage, dir) = temp_storage().await;
        let tracker = Arc::new(MockTaskTracker::with_projects(&[("2203306141", "Work")]));
        let analyzer = Arc::new(MockAnalyzer::new());
        let sessions = SessionManager::new(storage.clone(), tracker);
        let orchestrator = Orchestrator::new(
            sessions.clone(),
            storage.clone(),
            analyzer.clone(),
            reference_offset(180),
        );
        Fixture {
            orchestrator,
            sessions,
            storage,
            analyzer,
            _dir: dir,
        }
    }

    fn analyzed(title: &str, due: Option<&str>) -> AnalyzedTask {
        AnalyzedTask {
            title: title.into(),
            description: "Users cannot log in after the release".into(),
            due_date: due.map(str::to_string),
            priority: 3,
            labels: vec![],
        }
    }

    async fn open_with_messages(f: &Fixture, chat: ChatId, texts: &[&str]) -> SessionId {
        f.sessions.set_project(chat, "2203306141").await.unwrap();
        let id = f.sessions.start(chat, UserId(456)).await.unwrap();
        for (i, text) in texts.iter().enumerate() {
            f.sessions
                .save_message(chat, MessageId(i as i32 + 1), Some(UserId(456)), Some("alice"), text)
                .await
                .unwrap();
        }
        id
    }

    #[test]
    fn message_line_format() {
        let message = StoredMessage {
            id: 1,
            chat_id: ChatId(1),
            session_id: None,
            message_id: MessageId(1),
            user_id: None,
            username: None,
            text: "hello".into(),
            captured_at: Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap(),
        };
        assert_eq!(
            format_message_line(&message, reference_offset(180)),
            "Unknown Author, [2026-10-17 12:30:00]: hello"
        );
    }

    #[tokio::test]
    async fn preconditions_are_checked_in_order() {
        let f = fixture().await;
        let chat = ChatId(123);

        assert!(matches!(
            f.orchestrator.create_task_from_discussion(chat, UserId(456)).await,
            Err(BridgeError::NoActiveSession)
        ));

        f.sessions.start(chat, UserId(456)).await.unwrap();
        assert!(matches!(
            f.orchestrator.create_task_from_discussion(chat, UserId(789)).await,
            Err(BridgeError::NotOwner)
        ));
        assert!(matches!(
            f.orchestrator.create_task_from_discussion(chat, UserId(456)).await,
            Err(BridgeError::EmptyDiscussion)
        ));

        f.sessions
            .save_message(chat, MessageId(1), Some(UserId(456)), Some("alice"), "fix login")
            .await
            .unwrap();
        assert!(matches!(
            f.orchestrator.create_task_from_discussion(chat, UserId(456)).await,
            Err(BridgeError::ProjectNotSet)
        ));
        assert_eq!(f.analyzer.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn draft_is_stored_and_rendered() {
        let f = fixture().await;
        let chat = ChatId(123);
        let id = open_with_messages(&f, chat, &["login is broken", "назначить @ivan до завтра"]).await;
        f.analyzer.push_analysis(Ok(analyzed("Fix login", Some("tomorrow"))));

        let now = Utc.with_ymd_and_hms(2026, 10, 16, 22, 0, 0).unwrap();
        let preview = f.orchestrator.create_task_at(chat, UserId(456), now).await.unwrap();

        let draft = f.storage.get_draft(id).await.unwrap().unwrap();
        assert_eq!(draft.title, "Fix login");
        // 22:00 UTC is already the 17th in Moscow.
        assert_eq!(draft.due_date.as_deref(), Some("2026-10-18"));
        assert_eq!(draft.assignee.as_deref(), Some("@ivan"));
        assert_eq!(draft.priority, Some(3));

        let payloads: Vec<_> = preview.buttons.iter().map(|b| b.payload.clone()).collect();
        assert_eq!(
            payloads,
            vec![format!("confirm_task:{id}"), format!("edit_task:{id}"), format!("cancel_task:{id}")]
        );

        let lines = f.analyzer.last_analyze_input().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("alice, ["));
        assert!(lines[0].ends_with("]: login is broken"));
    }

    #[tokio::test]
    async fn empty_title_falls_back_to_first_message() {
        let f = fixture().await;
        let chat = ChatId(5);
        let id = open_with_messages(&f, chat, &["Deploy the hotfix", "asap"]).await;
        f.analyzer.push_analysis(Ok(analyzed("  ", None)));

        f.orchestrator.create_task_from_discussion(chat, UserId(456)).await.unwrap();
        let draft = f.storage.get_draft(id).await.unwrap().unwrap();
        assert_eq!(draft.title, "Deploy the hotfix");
        assert_eq!(draft.due_date, None);
    }

    #[tokio::test]
    async fn analysis_failure_writes_no_draft() {
        let f = fixture().await;
        let chat = ChatId(6);
        let id = open_with_messages(&f, chat, &["something"]).await;
        f.analyzer.push_analysis(Err(BridgeError::Analysis {
            message: "unparseable".into(),
            source: None,
        }));

        let err = f.orchestrator.create_task_from_discussion(chat, UserId(456)).await.unwrap_err();
        assert!(matches!(err, BridgeError::Analysis { .. }));
        assert!(f.storage.get_draft(id).await.unwrap().is_none());
        assert!(f.sessions.has_active(chat).await.unwrap());
    }

    #[tokio::test]
    async fn revise_keeps_assignee_and_records_audit() {
        let f = fixture().await;
        let chat = ChatId(7);
        let id = open_with_messages(&f, chat, &["@ivan please fix login"]).await;
        f.analyzer.push_analysis(Ok(analyzed("Fix login", None)));
        f.orchestrator.create_task_from_discussion(chat, UserId(456)).await.unwrap();

        let mut revised = analyzed("Fix login on mobile", Some("2026-11-01"));
        revised.priority = 4;
        f.analyzer.push_revision(Ok(revised));

        let preview = f.orchestrator.revise(id, "make it about mobile, urgent").await.unwrap();
        assert!(preview.content.starts_with("✅ **Task Updated!**"));
        assert_eq!(preview.buttons.len(), 3);

        let draft = f.storage.get_draft(id).await.unwrap().unwrap();
        assert_eq!(draft.title, "Fix login on mobile");
        assert_eq!(draft.priority, Some(4));
        assert_eq!(draft.assignee.as_deref(), Some("@ivan"));
        assert_eq!(f.storage.count_audit_edits(id).await.unwrap(), 1);

        let (input, feedback) = f.analyzer.last_revise_input().unwrap();
        assert_eq!(input.title, "Fix login");
        assert_eq!(feedback, "make it about mobile, urgent");
    }

    #[tokio::test]
    async fn revise_on_closed_session_is_stale() {
        let f = fixture().await;
        let chat = ChatId(8);
        let id = open_with_messages(&f, chat, &["x"]).await;
        f.sessions.close(chat).await.unwrap();
        assert!(matches!(
            f.orchestrator.revise(id, "anything").await,
            Err(BridgeError::StaleSession(_))
        ));
        assert!(matches!(
            f.orchestrator.revise(SessionId(999), "anything").await,
            Err(BridgeError::SessionNotFound(_))
        ));
    }

    #[test]
    fn diff_lists_changed_fields_only() {
        let before = DraftTask {
            session_id: SessionId(1),
            title: "a".into(),
            description: "d".into(),
            due_date: None,
            priority: Some(1),
            assignee: None,
            labels: vec![],
            updated_at: Utc::now(),
        };
        let mut after = before.clone();
        after.title = "b".into();
        after.priority = Some(4);
        let diff = draft_diff(&before, &after);
        assert_eq!(diff["title"], json!({"from": "a", "to": "b"}));
        assert_eq!(diff["priority"], json!({"from": 1, "to": 4}));
        assert!(diff.get("description").is_none());
    }
}
