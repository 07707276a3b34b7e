// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirm/edit/cancel protocol for the draft confirmation control.
//!
//! Payloads are `"{action}:{session_id}"`. Every press is checked against
//! the session owner before anything else happens; a denial never changes
//! state.

use std::str::FromStr;
use std::sync::Arc;

use strum::{Display, EnumString};
use todobridge_core::error::BridgeError;
use todobridge_core::types::{
    CallbackQuery, CreatedTaskRef, MessageId, NewTask, OutboundMessage, Session,
    SessionId, UserId,
};
use todobridge_core::{ChannelAdapter, StorageAdapter, TaskTrackerAdapter};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::edit_tracker::PendingEdits;
use crate::render;
use crate::session::SessionManager;

/// Separates action and session id in a payload.
pub const PAYLOAD_SEPARATOR: char = ':';

/// An action on the confirmation control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum CallbackAction {
    #[strum(serialize = "confirm_task")]
    Confirm,
    #[strum(serialize = "edit_task")]
    Edit,
    #[strum(serialize = "cancel_task")]
    Cancel,
}

impl CallbackAction {
    pub fn payload(self, session_id: SessionId) -> String {
        format!("{self}{PAYLOAD_SEPARATOR}{session_id}")
    }

    fn denial(self) -> &'static str {
        match self {
            Self::Confirm => "Only the user who started this discussion can confirm the task",
            Self::Edit => "Only the user who started this discussion can edit the task",
            Self::Cancel => "Only the user who started this discussion can cancel the task",
        }
    }
}

/// Splits a payload into action and session id.
pub fn parse_payload(data: &str) -> Result<(CallbackAction, SessionId), BridgeError> {
    let parts: Vec<&str> = data.split(PAYLOAD_SEPARATOR).collect();
    let [action, id] = parts.as_slice() else {
        return Err(BridgeError::InvalidCallback(data.to_string()));
    };
    let session_id = id
        .parse::<i64>()
        .map(SessionId)
        .map_err(|_| BridgeError::InvalidCallback(data.to_string()))?;
    let action = CallbackAction::from_str(action)
        .map_err(|_| BridgeError::UnknownAction((*action).to_string()))?;
    Ok((action, session_id))
}

/// Deterministic idempotency key for creating the task of a session.
pub fn idempotency_key(session_id: SessionId) -> String {
    Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        format!("todobridge:session:{session_id}:create-task").as_bytes(),
    )
    .to_string()
}

/// What a press produced, for the transport to act on.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CallbackOutcome {
    /// Short notification shown on the pressed button.
    pub notice: Option<String>,
    /// Whether the confirmation control should be removed.
    pub clear_buttons: bool,
    /// Follow-up message for the chat.
    pub reply: Option<OutboundMessage>,
}

impl CallbackOutcome {
    fn notice(text: impl Into<String>) -> Self {
        Self {
            notice: Some(text.into()),
            ..Self::default()
        }
    }
}

pub struct CallbackHandler {
    sessions: SessionManager,
    storage: Arc<dyn StorageAdapter>,
    tracker: Arc<dyn TaskTrackerAdapter>,
    channel: Arc<dyn ChannelAdapter>,
    pending_edits: Arc<PendingEdits>,
}

impl CallbackHandler {
    pub fn new(
        sessions: SessionManager,
        storage: Arc<dyn StorageAdapter>,
        tracker: Arc<dyn TaskTrackerAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        pending_edits: Arc<PendingEdits>,
    ) -> Self {
        Self {
            sessions,
            storage,
            tracker,
            channel,
            pending_edits,
        }
    }

    /// Resolves a press and performs its transport side effects: answer the
    /// press, clear the control, send the follow-up.
    pub async fn handle(&self, query: &CallbackQuery) {
        let outcome = match self.resolve(query).await {
            Ok(outcome) => outcome,
            Err(e) => self.failure_outcome(query, &e),
        };

        if let Err(e) = self
            .channel
            .answer_callback(&query.id, outcome.notice.clone())
            .await
        {
            warn!(chat_id = %query.chat_id, error = %e, "failed to answer callback");
        }

        if outcome.clear_buttons
            && let Some(message_id) = query.message_id
            && let Err(e) = self.channel.clear_buttons(query.chat_id, message_id).await
        {
            warn!(chat_id = %query.chat_id, error = %e, "failed to clear confirmation buttons");
        }

        if let Some(reply) = outcome.reply
            && let Err(e) = self.channel.send(reply).await
        {
            warn!(chat_id = %query.chat_id, error = %e, "failed to send callback reply");
        }
    }

    fn failure_outcome(&self, query: &CallbackQuery, e: &BridgeError) -> CallbackOutcome {
        if e.is_protocol() {
            debug!(chat_id = %query.chat_id, data = %query.data, error = %e, "rejected callback payload");
        } else if e.is_precondition() {
            debug!(chat_id = %query.chat_id, user_id = %query.user_id, error = %e, "callback precondition failed");
        } else {
            error!(chat_id = %query.chat_id, data = %query.data, error = %e, "callback failed");
        }
        CallbackOutcome::notice(e.user_message())
    }

    /// Runs the state machine for one press without touching the transport
    /// beyond what the action itself requires (the edit prompt).
    pub async fn resolve(&self, query: &CallbackQuery) -> Result<CallbackOutcome, BridgeError> {
        let (action, session_id) = parse_payload(&query.data)?;
        debug!(chat_id = %query.chat_id, session_id = %session_id, action = %action, "callback received");

        let session = self.sessions.get(session_id).await?;
        if session.owner_id != Some(query.user_id) || session.chat_id != query.chat_id {
            debug!(
                session_id = %session_id,
                user_id = %query.user_id,
                "callback from non-owner denied"
            );
            return Ok(CallbackOutcome::notice(action.denial()));
        }

        match action {
            CallbackAction::Confirm => self.confirm(&session).await,
            CallbackAction::Edit => self.edit(&session, query.user_id).await,
            CallbackAction::Cancel => self.cancel(&session).await,
        }
    }

    async fn confirm(&self, session: &Session) -> Result<CallbackOutcome, BridgeError> {
        // A task already created for this session wins over everything else,
        // including a session left open by a failed close.
        if let Some(existing) = self.storage.created_task_for_session(session.id).await? {
            info!(session_id = %session.id, task_id = %existing.external_id, "confirm after task creation");
            if session.is_open() {
                self.close_after_creation(session).await;
            }
            let title = match self.storage.get_draft(session.id).await {
                Ok(Some(draft)) => draft.title,
                _ => existing.external_id.clone(),
            };
            return Ok(CallbackOutcome {
                notice: Some("Task already created".into()),
                clear_buttons: true,
                reply: Some(OutboundMessage::text(
                    session.chat_id,
                    render::task_created(&title, &existing.url),
                )),
            });
        }

        if !session.is_open() {
            return Err(BridgeError::StaleSession(session.id));
        }

        let draft = self
            .storage
            .get_draft(session.id)
            .await?
            .ok_or(BridgeError::DraftNotFound(session.id))?;
        let project_id = self
            .storage
            .get_project_id(session.chat_id)
            .await?
            .ok_or(BridgeError::ProjectNotSet)?;

        let request = NewTask {
            content: draft.title.clone(),
            description: draft.description.clone(),
            project_id,
            priority: draft.priority,
            due_date: draft.due_date.clone(),
            labels: draft.labels.clone(),
        };
        let created = self
            .tracker
            .create_task(&request, &idempotency_key(session.id))
            .await?;
        info!(
            chat_id = %session.chat_id,
            session_id = %session.id,
            task_id = %created.id,
            "task created"
        );

        self.record_creation(session, &created).await;
        self.close_after_creation(session).await;

        Ok(CallbackOutcome {
            notice: Some("✅ Отлично! Создаю задачу.".into()),
            clear_buttons: true,
            reply: Some(OutboundMessage::text(
                session.chat_id,
                render::task_created(&draft.title, &created.url),
            )),
        })
    }

    /// Post-creation bookkeeping. The task exists, so failures are logged only.
    async fn record_creation(&self, session: &Session, created: &CreatedTaskRef) {
        if let Err(e) = self.storage.save_created_task(session.id, created).await {
            error!(
                session_id = %session.id,
                task_id = %created.id,
                error = %e,
                "failed to record created task"
            );
        }
    }

    async fn close_after_creation(&self, session: &Session) {
        match self.sessions.close_session(session).await {
            Ok(()) | Err(BridgeError::NoActiveSession) => {}
            Err(e) => {
                error!(session_id = %session.id, error = %e, "failed to close session after task creation");
            }
        }
        self.pending_edits.forget_session(session.id);
    }

    async fn edit(&self, session: &Session, user_id: UserId) -> Result<CallbackOutcome, BridgeError> {
        if !session.is_open() {
            return Err(BridgeError::StaleSession(session.id));
        }
        if self.storage.get_draft(session.id).await?.is_none() {
            return Err(BridgeError::DraftNotFound(session.id));
        }

        let prompt = OutboundMessage::text(session.chat_id, render::EDIT_PROMPT);
        let prompt_id: MessageId = self.channel.send(prompt).await?;
        self.pending_edits
            .track(session.chat_id, prompt_id, session.id, user_id);
        debug!(session_id = %session.id, prompt_id = %prompt_id, "awaiting edit reply");

        Ok(CallbackOutcome {
            notice: Some("✏️ Please reply to my next message with your edit instructions".into()),
            clear_buttons: true,
            reply: None,
        })
    }

    async fn cancel(&self, session: &Session) -> Result<CallbackOutcome, BridgeError> {
        if !session.is_open() {
            return Err(BridgeError::StaleSession(session.id));
        }
        self.sessions
            .close_session(session)
            .await
            .map_err(|e| match e {
                BridgeError::NoActiveSession => BridgeError::StaleSession(session.id),
                other => other,
            })?;
        self.pending_edits.forget_session(session.id);
        if let Err(e) = self.storage.delete_draft(session.id).await {
            warn!(session_id = %session.id, error = %e, "failed to delete draft of canceled session");
        }

        Ok(CallbackOutcome {
            notice: Some("❌ Got it! Task creation canceled.".into()),
            clear_buttons: true,
            reply: Some(OutboundMessage::text(session.chat_id, render::CANCELED)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trip() {
        let payload = CallbackAction::Confirm.payload(SessionId(12));
        assert_eq!(payload, "confirm_task:12");
        assert_eq!(
            parse_payload(&payload).unwrap(),
            (CallbackAction::Confirm, SessionId(12))
        );
        assert_eq!(
            parse_payload("edit_task:3").unwrap(),
            (CallbackAction::Edit, SessionId(3))
        );
        assert_eq!(
            parse_payload("cancel_task:-4").unwrap(),
            (CallbackAction::Cancel, SessionId(-4))
        );
    }

    #[test]
    fn malformed_payloads_are_invalid() {
        for data in ["", "confirm_task", "confirm_task:1:2", "confirm_task:abc", "confirm_task:"] {
            assert!(
                matches!(parse_payload(data), Err(BridgeError::InvalidCallback(_))),
                "payload {data:?}"
            );
        }
    }

    #[test]
    fn unknown_action_is_reported() {
        assert!(matches!(
            parse_payload("launch_rocket:1"),
            Err(BridgeError::UnknownAction(a)) if a == "launch_rocket"
        ));
    }

    #[test]
    fn idempotency_key_is_stable_per_session() {
        assert_eq!(idempotency_key(SessionId(1)), idempotency_key(SessionId(1)));
        assert_ne!(idempotency_key(SessionId(1)), idempotency_key(SessionId(2)));
    }

    mod protocol {
        use super::*;
        use chrono::Utc;
        use std::time::Duration;
        use todobridge_core::types::{ChatId, DraftTask, MessageId};
        use todobridge_test_utils::{MockChannel, MockTaskTracker, temp_storage};

        const CHAT: ChatId = ChatId(123);
        const OWNER: UserId = UserId(456);
        const OTHER: UserId = UserId(789);
        const PREVIEW: MessageId = MessageId(55);

        struct Fixture {
            handler: CallbackHandler,
            sessions: SessionManager,
            storage: Arc<dyn StorageAdapter>,
            tracker: Arc<MockTaskTracker>,
            channel: Arc<MockChannel>,
            edits: Arc<PendingEdits>,
            _dir: tempfile::TempDir,
        }

        async fn fixture() -> Fixture {
            let (storage, dir) = temp_storage().await;
            let tracker = Arc::new(MockTaskTracker::with_projects(&[("2203306141", "Work")]));
            let channel = Arc::new(MockChannel::new());
            let edits = Arc::new(PendingEdits::new(Duration::from_secs(60), 16));
            let sessions = SessionManager::new(storage.clone(), tracker.clone());
            let handler = CallbackHandler::new(
                sessions.clone(),
                storage.clone(),
                tracker.clone(),
                channel.clone(),
                edits.clone(),
            );
            Fixture {
                handler,
                sessions,
                storage,
                tracker,
                channel,
                edits,
                _dir: dir,
            }
        }

        /// An open session with a stored draft.
        async fn drafted(f: &Fixture) -> SessionId {
            f.sessions.set_project(CHAT, "2203306141").await.unwrap();
            let id = f.sessions.start(CHAT, OWNER).await.unwrap();
            f.storage
                .save_draft(&DraftTask {
                    session_id: id,
                    title: "Fix login".into(),
                    description: "Users cannot log in".into(),
                    due_date: Some("2026-10-20".into()),
                    priority: Some(3),
                    assignee: None,
                    labels: vec![],
                    updated_at: Utc::now(),
                })
                .await
                .unwrap();
            id
        }

        fn press(user: UserId, action: CallbackAction, id: SessionId) -> CallbackQuery {
            CallbackQuery {
                id: "cb-1".into(),
                chat_id: CHAT,
                message_id: Some(PREVIEW),
                user_id: user,
                data: action.payload(id),
            }
        }

        #[tokio::test]
        async fn non_owner_is_denied_without_side_effects() {
            let f = fixture().await;
            let id = drafted(&f).await;

            for action in [CallbackAction::Confirm, CallbackAction::Edit, CallbackAction::Cancel] {
                f.handler.handle(&press(OTHER, action, id)).await;
                let notice = f.channel.last_answer().unwrap();
                assert!(notice.starts_with("Only the user who started this discussion"), "{notice}");
            }

            assert_eq!(f.tracker.create_calls(), 0);
            assert!(f.sessions.has_active(CHAT).await.unwrap());
            assert!(f.storage.get_draft(id).await.unwrap().is_some());
            assert!(f.channel.cleared_buttons().is_empty());
            assert_eq!(f.channel.sent_count(), 0);
            assert!(f.edits.is_empty());
        }

        #[tokio::test]
        async fn confirm_creates_once_and_closes() {
            let f = fixture().await;
            let id = drafted(&f).await;

            f.handler.handle(&press(OWNER, CallbackAction::Confirm, id)).await;

            assert_eq!(f.tracker.create_calls(), 1);
            let (request, key) = f.tracker.create_requests().remove(0);
            assert_eq!(request.content, "Fix login");
            assert_eq!(request.project_id, "2203306141");
            assert_eq!(request.priority, Some(3));
            assert_eq!(key, idempotency_key(id));

            assert!(!f.sessions.has_active(CHAT).await.unwrap());
            let created = f.storage.created_task_for_session(id).await.unwrap().unwrap();
            assert_eq!(created.external_id, "7001");
            assert_eq!(f.channel.cleared_buttons(), vec![(CHAT, PREVIEW)]);
            assert_eq!(
                f.channel.last_sent().unwrap().message.content,
                "✅ **Задача создана**: [Fix login](https://todoist.com/showTask?id=7001)"
            );

            // A second press re-sends the link without another create call.
            f.handler.handle(&press(OWNER, CallbackAction::Confirm, id)).await;
            assert_eq!(f.tracker.create_calls(), 1);
            assert_eq!(f.channel.last_answer().as_deref(), Some("Task already created"));
        }

        #[tokio::test]
        async fn tracker_failure_leaves_session_open_for_retry() {
            let f = fixture().await;
            let id = drafted(&f).await;

            f.tracker.fail_create(true);
            f.handler.handle(&press(OWNER, CallbackAction::Confirm, id)).await;
            assert_eq!(
                f.channel.last_answer().as_deref(),
                Some("Something went wrong. Please try again later.")
            );
            assert!(f.sessions.has_active(CHAT).await.unwrap());
            assert!(f.storage.created_task_for_session(id).await.unwrap().is_none());
            assert!(f.channel.cleared_buttons().is_empty());

            f.tracker.fail_create(false);
            f.handler.handle(&press(OWNER, CallbackAction::Confirm, id)).await;
            assert_eq!(f.tracker.created_count(), 1);
            let keys: Vec<String> = f.tracker.create_requests().into_iter().map(|(_, k)| k).collect();
            assert_eq!(keys[0], keys[1]);
            assert!(!f.sessions.has_active(CHAT).await.unwrap());
        }

        #[tokio::test]
        async fn confirm_without_draft_or_project() {
            let f = fixture().await;
            let id = f.sessions.start(CHAT, OWNER).await.unwrap();

            let err = f.handler.resolve(&press(OWNER, CallbackAction::Confirm, id)).await.unwrap_err();
            assert!(matches!(err, BridgeError::DraftNotFound(_)));
            assert_eq!(f.tracker.create_calls(), 0);
        }

        #[tokio::test]
        async fn edit_sends_prompt_and_tracks_it() {
            let f = fixture().await;
            let id = drafted(&f).await;

            f.handler.handle(&press(OWNER, CallbackAction::Edit, id)).await;

            let prompt = f.channel.last_sent().unwrap();
            assert!(prompt.message.content.starts_with("✏️ **Editing task**"));
            let pending = f.edits.lookup(CHAT, OWNER, prompt.id).unwrap();
            assert_eq!(pending.session_id, id);
            assert!(f.edits.lookup(CHAT, OTHER, prompt.id).is_none());
            assert!(f.sessions.has_active(CHAT).await.unwrap());
            assert_eq!(f.channel.cleared_buttons(), vec![(CHAT, PREVIEW)]);
        }

        #[tokio::test]
        async fn cancel_closes_and_later_presses_are_stale() {
            let f = fixture().await;
            let id = drafted(&f).await;

            f.handler.handle(&press(OWNER, CallbackAction::Cancel, id)).await;
            assert_eq!(
                f.channel.last_answer().as_deref(),
                Some("❌ Got it! Task creation canceled.")
            );
            assert!(!f.sessions.has_active(CHAT).await.unwrap());
            assert!(f.storage.get_draft(id).await.unwrap().is_none());

            for action in [CallbackAction::Confirm, CallbackAction::Edit, CallbackAction::Cancel] {
                f.handler.handle(&press(OWNER, action, id)).await;
                assert_eq!(
                    f.channel.last_answer().as_deref(),
                    Some("This discussion is no longer active. The button is no longer valid.")
                );
            }
            assert_eq!(f.tracker.create_calls(), 0);
        }

        #[tokio::test]
        async fn malformed_and_unknown_payloads() {
            let f = fixture().await;
            let id = drafted(&f).await;

            for data in ["confirm_task".to_string(), "confirm_task:x".into(), format!("launch:{id}")] {
                let query = CallbackQuery {
                    data,
                    ..press(OWNER, CallbackAction::Confirm, id)
                };
                f.handler.handle(&query).await;
                assert_eq!(f.channel.last_answer().as_deref(), Some("Invalid request."));
            }
            assert!(f.sessions.has_active(CHAT).await.unwrap());
        }

        #[tokio::test]
        async fn unknown_session_is_no_longer_valid() {
            let f = fixture().await;
            f.handler
                .handle(&press(OWNER, CallbackAction::Confirm, SessionId(404)))
                .await;
            assert_eq!(
                f.channel.last_answer().as_deref(),
                Some("This discussion is no longer active. The button is no longer valid.")
            );
        }
    }
}
