// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! and captures everything the bridge sends back for assertions.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use todobridge_core::types::{ChatId, InboundEvent, MessageId, OutboundMessage};
use todobridge_core::{AdapterType, BridgeError, ChannelAdapter, HealthStatus, PluginAdapter};

/// First id handed out for sent messages.
const FIRST_SENT_ID: i32 = 10_000;

/// A message captured by [`MockChannel::send`], with the id it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub id: MessageId,
    pub message: OutboundMessage,
}

/// A mock chat transport.
///
/// Events injected with [`inject`](Self::inject) are returned by `receive()`
/// in order. After [`close`](Self::close), `receive()` fails once the queue
/// is empty.
pub struct MockChannel {
    inbound: Mutex<VecDeque<InboundEvent>>,
    notify: Notify,
    closed: AtomicBool,
    next_id: AtomicI32,
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<(MessageId, OutboundMessage)>>,
    cleared: Mutex<Vec<(ChatId, MessageId)>>,
    answers: Mutex<Vec<(String, Option<String>)>>,
    fail_sends: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            next_id: AtomicI32::new(FIRST_SENT_ID),
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            cleared: Mutex::new(Vec::new()),
            answers: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
        }
    }

    pub fn inject(&self, event: InboundEvent) {
        self.inbound.lock().unwrap().push_back(event);
        self.notify.notify_one();
    }

    /// Makes `receive()` fail with a "closed" error once drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Makes every later `send()` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent().into_iter().map(|s| s.message).collect()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.message.content).collect()
    }

    pub fn last_sent(&self) -> Option<SentMessage> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn edits(&self) -> Vec<(MessageId, OutboundMessage)> {
        self.edits.lock().unwrap().clone()
    }

    /// `(chat, message)` pairs whose confirmation buttons were removed.
    pub fn cleared_buttons(&self) -> Vec<(ChatId, MessageId)> {
        self.cleared.lock().unwrap().clone()
    }

    /// `(callback id, notice)` for every answered press.
    pub fn callback_answers(&self) -> Vec<(String, Option<String>)> {
        self.answers.lock().unwrap().clone()
    }

    pub fn last_answer(&self) -> Option<String> {
        self.answers
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, text)| text.clone())
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, BridgeError> {
        loop {
            let next = self.inbound.lock().unwrap().pop_front();
            if let Some(event) = next {
                return Ok(event);
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(BridgeError::Channel {
                    message: "mock channel closed".into(),
                    source: None,
                });
            }
            self.notify.notified().await;
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, BridgeError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BridgeError::Channel {
                message: "mock send failure".into(),
                source: None,
            });
        }
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sent.lock().unwrap().push(SentMessage { id, message: msg });
        Ok(id)
    }

    async fn edit_message(
        &self,
        message_id: MessageId,
        msg: OutboundMessage,
    ) -> Result<(), BridgeError> {
        self.edits.lock().unwrap().push((message_id, msg));
        Ok(())
    }

    async fn clear_buttons(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), BridgeError> {
        self.cleared.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<String>,
    ) -> Result<(), BridgeError> {
        self.answers
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use todobridge_core::types::{InboundMessage, UserId};

    fn message(text: &str) -> InboundEvent {
        InboundEvent::Message(InboundMessage {
            chat_id: ChatId(1),
            message_id: MessageId(1),
            user_id: Some(UserId(2)),
            username: Some("alice".into()),
            text: text.into(),
            reply_to: None,
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn receive_returns_injected_events_in_order() {
        let channel = MockChannel::new();
        channel.inject(message("one"));
        channel.inject(message("two"));

        for expected in ["one", "two"] {
            match channel.receive().await.unwrap() {
                InboundEvent::Message(m) => assert_eq!(m.text, expected),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn closed_channel_reports_closed_after_drain() {
        let channel = MockChannel::new();
        channel.inject(message("last"));
        channel.close();

        assert!(channel.receive().await.is_ok());
        let err = channel.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn send_assigns_increasing_ids() {
        let channel = MockChannel::new();
        let a = channel.send(OutboundMessage::text(ChatId(1), "a")).await.unwrap();
        let b = channel.send(OutboundMessage::text(ChatId(1), "b")).await.unwrap();
        assert!(b.0 > a.0);
        assert_eq!(channel.sent_texts(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn failing_sends_are_not_recorded() {
        let channel = MockChannel::new();
        channel.fail_sends(true);
        assert!(channel.send(OutboundMessage::text(ChatId(1), "x")).await.is_err());
        assert_eq!(channel.sent_count(), 0);
    }
}
