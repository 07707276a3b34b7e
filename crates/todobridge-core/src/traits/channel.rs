// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport adapter trait.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatId, InboundEvent, MessageId, OutboundMessage};

/// Adapter for the chat platform the bot lives in.
///
/// The core only needs four primitives: receive events, send text with an
/// optional button row, edit a previously sent message, and answer a button
/// press.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), BridgeError>;

    /// Receives the next inbound event from the channel.
    async fn receive(&self) -> Result<InboundEvent, BridgeError>;

    /// Sends a message and returns the platform id of the sent message.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, BridgeError>;

    /// Replaces the text and buttons of a message the bot sent earlier.
    /// An empty button list removes the control.
    async fn edit_message(
        &self,
        message_id: MessageId,
        msg: OutboundMessage,
    ) -> Result<(), BridgeError>;

    /// Removes the interactive control from a message, keeping its text.
    async fn clear_buttons(&self, chat_id: ChatId, message_id: MessageId)
    -> Result<(), BridgeError>;

    /// Acknowledges a button press, optionally with a short notification.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<String>,
    ) -> Result<(), BridgeError>;
}
