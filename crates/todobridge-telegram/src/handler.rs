// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion between teloxide updates and bridge events.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, Message};
use todobridge_core::types::{
    ActionButton, CallbackQuery, ChatId, InboundMessage, MessageId, UserId,
};
use tracing::debug;

/// Converts a Telegram message into an [`InboundMessage`].
///
/// Captions count as text. Returns `None` for messages without any text
/// (stickers, service messages) and for messages sent by other bots.
pub fn to_inbound_message(msg: &Message) -> Option<InboundMessage> {
    let Some(text) = msg.text().or_else(|| msg.caption()) else {
        debug!(msg_id = msg.id.0, "ignoring message without text");
        return None;
    };

    if msg.from.as_ref().is_some_and(|u| u.is_bot) {
        debug!(msg_id = msg.id.0, "ignoring message from a bot");
        return None;
    }

    let user_id = msg.from.as_ref().map(|u| UserId(u.id.0 as i64));
    let username = msg.from.as_ref().and_then(|u| u.username.clone());

    Some(InboundMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        user_id,
        username,
        text: text.to_string(),
        reply_to: msg.reply_to_message().map(|r| MessageId(r.id.0)),
        timestamp: msg.date,
    })
}

/// Converts a button press into a [`CallbackQuery`].
///
/// Presses on messages Telegram no longer exposes, and presses without
/// data, yield `None`.
pub fn to_callback_query(q: &teloxide::types::CallbackQuery) -> Option<CallbackQuery> {
    let message = q.message.as_ref()?;
    let data = q.data.clone()?;
    Some(CallbackQuery {
        id: q.id.0.clone(),
        chat_id: ChatId(message.chat().id.0),
        message_id: Some(MessageId(message.id().0)),
        user_id: UserId(q.from.id.0 as i64),
        data,
    })
}

/// Builds a single-row inline keyboard, or `None` when there are no buttons.
pub fn keyboard(buttons: &[ActionButton]) -> Option<InlineKeyboardMarkup> {
    if buttons.is_empty() {
        return None;
    }
    let row: Vec<InlineKeyboardButton> = buttons
        .iter()
        .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.payload.clone()))
        .collect();
    Some(InlineKeyboardMarkup::new(vec![row]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn group_message(extra: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 17,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Team",
            },
            "from": {
                "id": 456,
                "is_bot": false,
                "first_name": "Alice",
                "username": "alice",
            },
        });
        if let (Some(base), Some(extra)) = (json.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    #[test]
    fn text_message_maps_fields() {
        let msg = group_message(serde_json::json!({ "text": "fix the login page" }));
        let inbound = to_inbound_message(&msg).unwrap();

        assert_eq!(inbound.chat_id, ChatId(-100123));
        assert_eq!(inbound.message_id, MessageId(17));
        assert_eq!(inbound.user_id, Some(UserId(456)));
        assert_eq!(inbound.username.as_deref(), Some("alice"));
        assert_eq!(inbound.text, "fix the login page");
        assert_eq!(inbound.reply_to, None);
        assert_eq!(inbound.timestamp.timestamp(), 1700000000);
    }

    #[test]
    fn reply_keeps_parent_id() {
        let msg = group_message(serde_json::json!({
            "text": "make it urgent",
            "reply_to_message": {
                "message_id": 900,
                "date": 1699999990i64,
                "chat": { "id": -100123i64, "type": "supergroup", "title": "Team" },
                "from": { "id": 1, "is_bot": true, "first_name": "Bot" },
                "text": "Editing task",
            },
        }));
        assert_eq!(to_inbound_message(&msg).unwrap().reply_to, Some(MessageId(900)));
    }

    #[test]
    fn caption_counts_as_text() {
        let msg = group_message(serde_json::json!({
            "caption": "screenshot of the bug",
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 10,
                "height": 10,
            }],
        }));
        assert_eq!(to_inbound_message(&msg).unwrap().text, "screenshot of the bug");
    }

    #[test]
    fn message_without_text_is_ignored() {
        let msg = group_message(serde_json::json!({
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 10,
                "height": 10,
            }],
        }));
        assert!(to_inbound_message(&msg).is_none());
    }

    #[test]
    fn bot_messages_are_ignored() {
        let msg = group_message(serde_json::json!({
            "text": "hello",
            "from": { "id": 99, "is_bot": true, "first_name": "Other" },
        }));
        assert!(to_inbound_message(&msg).is_none());
    }

    #[test]
    fn callback_query_maps_fields() {
        let json = serde_json::json!({
            "id": "4382",
            "from": { "id": 456, "is_bot": false, "first_name": "Alice" },
            "chat_instance": "-1",
            "data": "confirm_task:42",
            "message": {
                "message_id": 55,
                "date": 1700000000i64,
                "chat": { "id": -100123i64, "type": "supergroup", "title": "Team" },
                "text": "Draft Task Preview",
            },
        });
        let q: teloxide::types::CallbackQuery = serde_json::from_value(json).unwrap();
        let callback = to_callback_query(&q).unwrap();

        assert_eq!(callback.id, "4382");
        assert_eq!(callback.chat_id, ChatId(-100123));
        assert_eq!(callback.message_id, Some(MessageId(55)));
        assert_eq!(callback.user_id, UserId(456));
        assert_eq!(callback.data, "confirm_task:42");
    }

    #[test]
    fn callback_without_data_is_ignored() {
        let json = serde_json::json!({
            "id": "1",
            "from": { "id": 456, "is_bot": false, "first_name": "Alice" },
            "chat_instance": "-1",
            "game_short_name": "g",
            "message": {
                "message_id": 55,
                "date": 1700000000i64,
                "chat": { "id": -100123i64, "type": "supergroup", "title": "Team" },
                "text": "x",
            },
        });
        let q: teloxide::types::CallbackQuery = serde_json::from_value(json).unwrap();
        assert!(to_callback_query(&q).is_none());
    }

    #[test]
    fn keyboard_is_one_row_of_callback_buttons() {
        assert!(keyboard(&[]).is_none());

        let markup = keyboard(&[
            ActionButton::new("✅ Confirm", "confirm_task:1"),
            ActionButton::new("❌ Cancel", "cancel_task:1"),
        ])
        .unwrap();
        assert_eq!(markup.inline_keyboard.len(), 1);
        let row = &markup.inline_keyboard[0];
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].text, "✅ Confirm");
        assert!(matches!(
            &row[1].kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "cancel_task:1"
        ));
    }
}
