// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Todobridge.
//!
//! Errors fall into three families:
//!
//! - **Precondition** errors are expected outcomes of user actions (no session
//!   running, wrong user pressing a button). They are answered with a remedy
//!   and never logged as failures.
//! - **Protocol** errors come from malformed interactive payloads.
//! - **Collaborator** errors wrap failures of the store, the chat transport,
//!   the task tracker or the analysis service.

use thiserror::Error;

use crate::types::SessionId;

/// The primary error type used across all Todobridge adapter traits and core operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No discussion is currently open in the chat.
    #[error("no active session")]
    NoActiveSession,

    /// A discussion is already open in the chat.
    #[error("a session is already open for this chat")]
    SessionAlreadyExists,

    /// The chat has no task-tracker project configured.
    #[error("no project configured for this chat")]
    ProjectNotSet,

    /// The session has no captured messages to analyze.
    #[error("session has no messages")]
    EmptyDiscussion,

    /// The acting user did not start the session.
    #[error("user is not the session owner")]
    NotOwner,

    /// The referenced session does not exist.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The project reference does not match any project in the tracker.
    #[error("invalid project: {0}")]
    InvalidProject(String),

    /// The session has no draft task to act on.
    #[error("no draft task for session {0}")]
    DraftNotFound(SessionId),

    /// The session referenced by an interaction is already closed.
    #[error("session {0} is no longer active")]
    StaleSession(SessionId),

    /// Malformed interactive payload.
    #[error("invalid callback payload: {0}")]
    InvalidCallback(String),

    /// Interactive payload names an action nobody handles.
    #[error("unknown callback action: {0}")]
    UnknownAction(String),

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (send failure, edit rejected, connection lost).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Task tracker API errors.
    #[error("task tracker error: {message}")]
    TaskTracker {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Analysis service errors, including unparseable model output.
    #[error("analysis error: {message}")]
    Analysis {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Returns true for expected, user-caused outcomes that need a remedy
    /// rather than an error log.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NoActiveSession
                | Self::SessionAlreadyExists
                | Self::ProjectNotSet
                | Self::EmptyDiscussion
                | Self::NotOwner
                | Self::SessionNotFound(_)
                | Self::InvalidProject(_)
                | Self::DraftNotFound(_)
                | Self::StaleSession(_)
        )
    }

    /// Returns true for malformed interactive payloads.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::InvalidCallback(_) | Self::UnknownAction(_))
    }

    /// Fixed user-safe text for this error. Collaborator errors never leak
    /// their inner message.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoActiveSession => {
                "No active discussion. Use /start_discussion to begin one."
            }
            Self::SessionAlreadyExists => {
                "A discussion is already in progress! Use /create_task to finish it or /cancel to drop it."
            }
            Self::ProjectNotSet => {
                "Project ID not set. Please use /set_project <project_id> first."
            }
            Self::EmptyDiscussion => {
                "No messages in the current discussion. Write something first."
            }
            Self::NotOwner => "Only the user who started this discussion can do that.",
            Self::SessionNotFound(_) | Self::StaleSession(_) => {
                "This discussion is no longer active. The button is no longer valid."
            }
            Self::InvalidProject(_) => "Invalid project ID. Please check and try again.",
            Self::DraftNotFound(_) => {
                "No draft task found for this discussion. Use /create_task to generate one."
            }
            Self::InvalidCallback(_) | Self::UnknownAction(_) => "Invalid request.",
            Self::Timeout { .. } => "The request took too long. Please try again.",
            Self::Config(_)
            | Self::Storage { .. }
            | Self::Channel { .. }
            | Self::TaskTracker { .. }
            | Self::Analysis { .. }
            | Self::Internal(_) => "Something went wrong. Please try again later.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_errors_are_classified() {
        assert!(BridgeError::NoActiveSession.is_precondition());
        assert!(BridgeError::NotOwner.is_precondition());
        assert!(BridgeError::StaleSession(SessionId(3)).is_precondition());
        assert!(!BridgeError::Internal("x".into()).is_precondition());
        assert!(!BridgeError::InvalidCallback("x".into()).is_precondition());
    }

    #[test]
    fn protocol_errors_are_classified() {
        assert!(BridgeError::InvalidCallback("a:b:c".into()).is_protocol());
        assert!(BridgeError::UnknownAction("launch".into()).is_protocol());
        assert!(!BridgeError::NotOwner.is_protocol());
    }

    #[test]
    fn collaborator_errors_do_not_leak_details() {
        let err = BridgeError::TaskTracker {
            message: "POST /tasks failed with status 500: secret body".into(),
            source: None,
        };
        assert!(!err.user_message().contains("secret"));
        assert_eq!(err.user_message(), "Something went wrong. Please try again later.");
    }

    #[test]
    fn display_includes_session_id() {
        let err = BridgeError::SessionNotFound(SessionId(42));
        assert_eq!(err.to_string(), "session 42 not found");
    }
}
