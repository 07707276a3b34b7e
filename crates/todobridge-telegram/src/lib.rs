// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport for the bridge.
//!
//! Implements [`ChannelAdapter`] on top of teloxide long polling. Group
//! messages and inline-button presses are forwarded as [`InboundEvent`]s;
//! outbound markup is rendered as MarkdownV2 with a plain-text fallback.

pub mod handler;
pub mod markdown;

use std::sync::Mutex;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ParseMode, ReplyParameters};
use tokio::sync::mpsc;
use todobridge_config::model::TelegramConfig;
use todobridge_core::types::{ChatId, InboundEvent, MessageId, OutboundMessage};
use todobridge_core::{AdapterType, BridgeError, ChannelAdapter, HealthStatus, PluginAdapter};
use tracing::{debug, info, warn};

/// Depth of the queue between the polling task and [`ChannelAdapter::receive`].
const INBOUND_QUEUE_DEPTH: usize = 100;

fn channel_err(what: &str, e: teloxide::RequestError) -> BridgeError {
    BridgeError::Channel {
        message: format!("failed to {what}: {e}"),
        source: Some(Box::new(e)),
    }
}

fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat_id.0)
}

fn tg_message(message_id: MessageId) -> teloxide::types::MessageId {
    teloxide::types::MessageId(message_id.0)
}

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, BridgeError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            BridgeError::Config("telegram.bot_token is required".into())
        })?;
        if token.trim().is_empty() {
            return Err(BridgeError::Config("telegram.bot_token cannot be empty".into()));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);
        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: Mutex::new(None),
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Sends `msg` rendered as MarkdownV2.
    async fn send_formatted(&self, msg: &OutboundMessage) -> Result<Message, teloxide::RequestError> {
        let mut request = self
            .bot
            .send_message(tg_chat(msg.chat_id), markdown::to_markdown_v2(&msg.content))
            .parse_mode(ParseMode::MarkdownV2);
        if let Some(markup) = handler::keyboard(&msg.buttons) {
            request = request.reply_markup(markup);
        }
        if let Some(reply_to) = msg.reply_to {
            request = request.reply_parameters(
                ReplyParameters::new(tg_message(reply_to)).allow_sending_without_reply(),
            );
        }
        request.await
    }

    async fn send_plain(&self, msg: &OutboundMessage) -> Result<Message, teloxide::RequestError> {
        let mut request = self
            .bot
            .send_message(tg_chat(msg.chat_id), markdown::to_plain_text(&msg.content));
        if let Some(markup) = handler::keyboard(&msg.buttons) {
            request = request.reply_markup(markup);
        }
        if let Some(reply_to) = msg.reply_to {
            request = request.reply_parameters(
                ReplyParameters::new(tg_message(reply_to)).allow_sending_without_reply(),
            );
        }
        request.await
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        debug!("Telegram channel shutting down");
        let handle = self
            .polling_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), BridgeError> {
        let mut slot = self.polling_handle.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let tx = message_tx.clone();
                    async move {
                        if let Some(inbound) = handler::to_inbound_message(&msg)
                            && tx.send(InboundEvent::Message(inbound)).await.is_err()
                        {
                            warn!("inbound channel closed, dropping message");
                        }
                        respond(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(
                    move |q: teloxide::types::CallbackQuery| {
                        let tx = callback_tx.clone();
                        async move {
                            match handler::to_callback_query(&q) {
                                Some(callback) => {
                                    if tx.send(InboundEvent::Callback(callback)).await.is_err() {
                                        warn!("inbound channel closed, dropping callback");
                                    }
                                }
                                None => debug!(callback_id = %q.id.0, "ignoring callback without data"),
                            }
                            respond(())
                        }
                    },
                ));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        *slot = Some(handle);
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, BridgeError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| BridgeError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, BridgeError> {
        let sent = match self.send_formatted(&msg).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!(error = %e, "MarkdownV2 failed, sending as plain text");
                self.send_plain(&msg)
                    .await
                    .map_err(|e| channel_err("send message", e))?
            }
        };
        Ok(MessageId(sent.id.0))
    }

    async fn edit_message(
        &self,
        message_id: MessageId,
        msg: OutboundMessage,
    ) -> Result<(), BridgeError> {
        let chat_id = tg_chat(msg.chat_id);
        let msg_id = tg_message(message_id);
        let markup = handler::keyboard(&msg.buttons);

        let mut request = self
            .bot
            .edit_message_text(chat_id, msg_id, markdown::to_markdown_v2(&msg.content))
            .parse_mode(ParseMode::MarkdownV2);
        if let Some(markup) = markup.clone() {
            request = request.reply_markup(markup);
        }

        match request.await {
            Ok(_) => Ok(()),
            Err(e) => {
                let err_str = e.to_string();
                if err_str.contains("message is not modified") {
                    Ok(())
                } else if err_str.contains("can't parse entities") {
                    warn!(error = %e, "MarkdownV2 edit failed, retrying as plain text");
                    let mut plain = self.bot.edit_message_text(
                        chat_id,
                        msg_id,
                        markdown::to_plain_text(&msg.content),
                    );
                    if let Some(markup) = markup {
                        plain = plain.reply_markup(markup);
                    }
                    plain.await.map_err(|e| channel_err("edit message", e))?;
                    Ok(())
                } else {
                    Err(channel_err("edit message", e))
                }
            }
        }
    }

    async fn clear_buttons(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), BridgeError> {
        match self
            .bot
            .edit_message_reply_markup(tg_chat(chat_id), tg_message(message_id))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("message is not modified") => Ok(()),
            Err(e) => Err(channel_err("clear buttons", e)),
        }
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<String>,
    ) -> Result<(), BridgeError> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await.map_err(|e| channel_err("answer callback", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            allowed_chats: vec![],
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramChannel::new(&config(None)).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramChannel::new(&config(Some("  "))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        assert!(
            TelegramChannel::new(&config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11")))
                .is_ok()
        );
    }

    #[test]
    fn plugin_adapter_metadata() {
        let channel = TelegramChannel::new(&config(Some("test:token"))).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }

    #[tokio::test]
    async fn shutdown_without_connect_is_noop() {
        let channel = TelegramChannel::new(&config(Some("test:token"))).unwrap();
        channel.shutdown().await.unwrap();
    }
}
