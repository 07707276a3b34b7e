// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-facing texts for drafts and task links.
//!
//! Everything taken from users or the analysis model passes through
//! [`escape_markup`] before it is embedded.

use std::fmt::Write;

use todobridge_core::types::{
    ActionButton, ChatId, DraftTask, OutboundMessage, SessionId, escape_markup, priority_label,
};

use crate::callback::CallbackAction;
use crate::dates::format_due_for_display;

pub const EDIT_PROMPT: &str = "✏️ **Editing task**\n\n\
    Please reply to this message with your edit instructions.\n\n\
    Examples:\n\
    • Change the title to \"Prepare the release notes\"\n\
    • Set the due date to Friday\n\
    • Raise the priority to urgent";

pub const CANCELED: &str =
    "❌ Создание задачи отменено. Обсуждение закрыто, можно начать новое с помощью /start_discussion.";

/// The confirm/edit/cancel control for a session's draft.
pub fn confirmation_buttons(session_id: SessionId) -> Vec<ActionButton> {
    vec![
        ActionButton::new("✅ Confirm", CallbackAction::Confirm.payload(session_id)),
        ActionButton::new("✏️ Edit", CallbackAction::Edit.payload(session_id)),
        ActionButton::new("❌ Cancel", CallbackAction::Cancel.payload(session_id)),
    ]
}

/// Preview of a freshly analyzed draft, with the confirmation control.
pub fn draft_preview(chat_id: ChatId, draft: &DraftTask) -> OutboundMessage {
    let mut text = String::from("📝 **Draft Task Preview**\n\n");
    let _ = write!(text, "**Title:** {}\n\n", escape_markup(&draft.title));
    let _ = write!(text, "**Description:** {}\n\n", escape_markup(&draft.description));
    if let Some(due) = draft.due_date.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(text, "**Due:** {}\n\n", escape_markup(&format_due_for_display(due)));
    }
    let _ = write!(
        text,
        "**Priority:** {}\n\n",
        priority_label(draft.priority.unwrap_or(1))
    );
    if let Some(assignee) = &draft.assignee {
        let _ = write!(text, "**Assigned to:** {}\n\n", escape_markup(assignee));
    }
    if !draft.labels.is_empty() {
        let _ = write!(text, "**Labels:** {}\n\n", escape_markup(&draft.labels.join(", ")));
    }
    text.push_str("Please confirm to create this task in Todoist.");

    OutboundMessage::text(chat_id, text).with_buttons(confirmation_buttons(draft.session_id))
}

/// Preview after a revision was applied.
pub fn revised_preview(chat_id: ChatId, draft: &DraftTask) -> OutboundMessage {
    let mut text = String::from("✅ **Task Updated!**\n\nNew details:\n");
    let _ = writeln!(text, "**Title:** {}", escape_markup(&draft.title));
    let _ = writeln!(text, "**Description:** {}", escape_markup(&draft.description));
    let due = draft
        .due_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(format_due_for_display)
        .unwrap_or_else(|| "Not set".to_string());
    let _ = writeln!(text, "**Due:** {}", escape_markup(&due));
    let _ = writeln!(text, "**Priority:** {}", priority_label(draft.priority.unwrap_or(1)));
    if let Some(assignee) = &draft.assignee {
        let _ = writeln!(text, "**Assigned to:** {}", escape_markup(assignee));
    }
    if !draft.labels.is_empty() {
        let _ = writeln!(text, "**Labels:** {}", escape_markup(&draft.labels.join(", ")));
    }
    text.push_str("\nConfirm, edit again or cancel.");

    OutboundMessage::text(chat_id, text).with_buttons(confirmation_buttons(draft.session_id))
}

pub fn task_created(title: &str, url: &str) -> String {
    format!("✅ **Задача создана**: [{}]({})", escape_markup(title), escape_markup(url))
}
