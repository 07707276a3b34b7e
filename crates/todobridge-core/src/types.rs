// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the adapters and the discussion core.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Platform-assigned chat identifier.
    ChatId(i64)
);
id_newtype!(
    /// Platform-assigned user identifier.
    UserId(i64)
);
id_newtype!(
    /// Sequential discussion session identifier.
    SessionId(i64)
);
id_newtype!(
    /// Platform-assigned message identifier, unique within a chat.
    MessageId(i32)
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    TaskTracker,
    Analysis,
}

// --- Durable entities ---

/// Lifecycle state of a discussion session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// A bounded window of a chat during which messages are collected toward one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub chat_id: ChatId,
    /// The user who started the session. Never changes.
    pub owner_id: Option<UserId>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

/// A chat message captured by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: i64,
    pub chat_id: ChatId,
    pub session_id: Option<SessionId>,
    pub message_id: MessageId,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub text: String,
    pub captured_at: DateTime<Utc>,
}

/// The not-yet-committed task proposal for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftTask {
    pub session_id: SessionId,
    pub title: String,
    pub description: String,
    /// ISO date (`YYYY-MM-DD`) or a free-form string the tracker understands.
    pub due_date: Option<String>,
    /// 1 (normal) to 4 (urgent).
    pub priority: Option<u8>,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl DraftTask {
    /// View of this draft as analysis output, used as input to a revision.
    pub fn to_analyzed(&self) -> AnalyzedTask {
        AnalyzedTask {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date.clone(),
            priority: self.priority.unwrap_or(1),
            labels: self.labels.clone(),
        }
    }
}

/// Record of a task that was successfully created in the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTask {
    pub id: i64,
    pub session_id: SessionId,
    pub external_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Record of a revision applied to a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEdit {
    pub session_id: SessionId,
    pub instruction: String,
    pub diff: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// --- Analysis ---

/// Structured task proposal produced by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub priority: u8,
    pub labels: Vec<String>,
}

/// Human label for a tracker priority.
pub fn priority_label(priority: u8) -> &'static str {
    match priority {
        2 => "Medium",
        3 => "High",
        4 => "Urgent",
        _ => "Normal",
    }
}

// --- Task tracker ---

/// A project in the task tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// Request to create a task in the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub content: String,
    pub description: String,
    pub project_id: String,
    pub priority: Option<u8>,
    pub due_date: Option<String>,
    pub labels: Vec<String>,
}

/// Partial update of an existing tracker task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub content: Option<String>,
    pub description: Option<String>,
    pub priority: Option<u8>,
    /// Natural-language or ISO due string.
    pub due_string: Option<String>,
    /// Replaces the whole label set when present.
    pub labels: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_string.is_none()
            && self.labels.is_none()
    }
}

/// Identity of a task returned by the tracker after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTaskRef {
    pub id: String,
    pub url: String,
}

/// A task as reported by the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerTask {
    pub id: String,
    pub content: String,
    pub description: String,
    pub url: String,
    pub due: Option<String>,
    pub priority: u8,
    pub labels: Vec<String>,
    pub project_id: String,
    pub is_completed: bool,
}

// --- Chat transport ---

/// A text message received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub text: String,
    /// The message this one replies to, if any.
    pub reply_to: Option<MessageId>,
    pub timestamp: DateTime<Utc>,
}

/// A button press on an interactive control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackQuery {
    /// Transport-specific id used to answer the press.
    pub id: String,
    pub chat_id: ChatId,
    /// The bot message carrying the pressed control.
    pub message_id: Option<MessageId>,
    pub user_id: UserId,
    pub data: String,
}

/// Anything the transport delivers to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(InboundMessage),
    Callback(CallbackQuery),
}

impl InboundEvent {
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Message(m) => m.chat_id,
            Self::Callback(c) => c.chat_id,
        }
    }
}

/// A button on an interactive control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: String,
    pub payload: String,
}

impl ActionButton {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Characters with meaning in [`OutboundMessage`] markup.
const MARKUP_CHARS: &[char] = &['\\', '*', '`', '[', ']', '(', ')'];

/// Backslash-escapes markup characters so `text` renders literally.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKUP_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A message to send or an edit to apply through the chat transport.
///
/// `content` is lightweight markup: `**bold**` spans, `` `code` `` spans and
/// `[label](url)` links, with `\` escaping the next character. Everything
/// else is literal text; transports escape it as needed. Interpolated user
/// text goes through [`escape_markup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub content: String,
    /// A single row of buttons. Empty means no control.
    pub buttons: Vec<ActionButton>,
    pub reply_to: Option<MessageId>,
}

impl OutboundMessage {
    pub fn text(chat_id: ChatId, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            content: content.into(),
            buttons: Vec::new(),
            reply_to: None,
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<ActionButton>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn replying_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn session_status_round_trips_as_lowercase() {
        assert_eq!(SessionStatus::Open.to_string(), "open");
        assert_eq!(
            SessionStatus::from_str("closed").unwrap(),
            SessionStatus::Closed
        );
        assert!(SessionStatus::from_str("pending").is_err());
    }

    #[test]
    fn ids_display_as_bare_numbers() {
        assert_eq!(SessionId(17).to_string(), "17");
        assert_eq!(ChatId(-100123).to_string(), "-100123");
    }

    #[test]
    fn priority_labels() {
        assert_eq!(priority_label(1), "Normal");
        assert_eq!(priority_label(2), "Medium");
        assert_eq!(priority_label(3), "High");
        assert_eq!(priority_label(4), "Urgent");
        assert_eq!(priority_label(0), "Normal");
    }

    #[test]
    fn draft_to_analyzed_defaults_priority() {
        let draft = DraftTask {
            session_id: SessionId(1),
            title: "Fix login".into(),
            description: "Users cannot log in".into(),
            due_date: None,
            priority: None,
            assignee: Some("@ivan".into()),
            labels: vec!["backend".into()],
            updated_at: Utc::now(),
        };
        let analyzed = draft.to_analyzed();
        assert_eq!(analyzed.priority, 1);
        assert_eq!(analyzed.labels, vec!["backend".to_string()]);
    }

    #[test]
    fn outbound_builder() {
        let msg = OutboundMessage::text(ChatId(5), "hi")
            .with_buttons(vec![ActionButton::new("OK", "ok:1")])
            .replying_to(MessageId(9));
        assert_eq!(msg.buttons.len(), 1);
        assert_eq!(msg.reply_to, Some(MessageId(9)));
    }

    #[test]
    fn escape_markup_protects_user_text() {
        assert_eq!(escape_markup("plain"), "plain");
        assert_eq!(escape_markup("**x** [a](b)"), "\\*\\*x\\*\\* \\[a\\]\\(b\\)");
        assert_eq!(escape_markup("a\\b `c`"), "a\\\\b \\`c\\`");
    }

    #[test]
    fn inbound_event_chat_id() {
        let event = InboundEvent::Callback(CallbackQuery {
            id: "cb".into(),
            chat_id: ChatId(77),
            message_id: None,
            user_id: UserId(1),
            data: "confirm_task:1".into(),
        });
        assert_eq!(event.chat_id(), ChatId(77));
    }

    #[test]
    fn task_update_emptiness() {
        assert!(TaskUpdate::default().is_empty());
        let update = TaskUpdate {
            priority: Some(4),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
