// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end flows.
//!
//! `TestHarness` wires a real [`Bridge`] to mock adapters and a temp SQLite
//! database, and offers helpers that feed it messages, replies and button
//! presses the way the chat transport would.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use chrono::Utc;
use todobridge_agent::Bridge;
use todobridge_config::model::SessionConfig;
use todobridge_core::types::{
    AnalyzedTask, CallbackQuery, ChatId, InboundEvent, InboundMessage, MessageId, UserId,
};
use todobridge_core::StorageAdapter;

use crate::mock_analyzer::MockAnalyzer;
use crate::mock_channel::MockChannel;
use crate::mock_tracker::MockTaskTracker;
use crate::temp_storage;

/// Project every harness tracker knows about.
pub const TEST_PROJECT_ID: &str = "2203306141";

/// Builder for test environments.
pub struct TestHarnessBuilder {
    projects: Vec<(String, String)>,
    analyses: Vec<AnalyzedTask>,
    session: SessionConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            projects: vec![(TEST_PROJECT_ID.to_string(), "Work".to_string())],
            analyses: Vec::new(),
            session: SessionConfig::default(),
        }
    }

    /// Adds a project to the mock tracker.
    pub fn with_project(mut self, id: &str, name: &str) -> Self {
        self.projects.push((id.to_string(), name.to_string()));
        self
    }

    /// Queues analysis results, returned in order.
    pub fn with_analysis(mut self, task: AnalyzedTask) -> Self {
        self.analyses.push(task);
        self
    }

    pub fn with_session_config(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub async fn build(self) -> TestHarness {
        let (storage, dir) = temp_storage().await;

        let projects: Vec<(&str, &str)> = self
            .projects
            .iter()
            .map(|(id, name)| (id.as_str(), name.as_str()))
            .collect();
        let tracker = Arc::new(MockTaskTracker::with_projects(&projects));

        let analyzer = Arc::new(MockAnalyzer::new());
        for task in self.analyses {
            analyzer.push_analysis(Ok(task));
        }

        let channel = Arc::new(MockChannel::new());
        let bridge = Arc::new(Bridge::new(
            channel.clone(),
            storage.clone(),
            tracker.clone(),
            analyzer.clone(),
            &self.session,
        ));

        TestHarness {
            bridge,
            channel,
            tracker,
            analyzer,
            storage,
            session: self.session,
            next_message_id: AtomicI32::new(1),
            _temp_dir: dir,
        }
    }
}

/// A wired bridge over mocks and a temp database.
pub struct TestHarness {
    pub bridge: Arc<Bridge>,
    pub channel: Arc<MockChannel>,
    pub tracker: Arc<MockTaskTracker>,
    pub analyzer: Arc<MockAnalyzer>,
    pub storage: Arc<dyn StorageAdapter>,
    pub session: SessionConfig,
    next_message_id: AtomicI32,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    /// An inbound text message with a fresh message id.
    pub fn message(&self, chat: i64, user: i64, text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: ChatId(chat),
            message_id: MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst)),
            user_id: Some(UserId(user)),
            username: Some(format!("user{user}")),
            text: text.to_string(),
            reply_to: None,
            timestamp: Utc::now(),
        }
    }

    /// Feeds a text message (or command) through the bridge.
    pub async fn say(&self, chat: i64, user: i64, text: &str) -> MessageId {
        let message = self.message(chat, user, text);
        let id = message.message_id;
        self.bridge.handle_event(InboundEvent::Message(message)).await;
        id
    }

    /// Feeds a reply to `reply_to` through the bridge.
    pub async fn reply(&self, chat: i64, user: i64, reply_to: MessageId, text: &str) -> MessageId {
        let mut message = self.message(chat, user, text);
        message.reply_to = Some(reply_to);
        let id = message.message_id;
        self.bridge.handle_event(InboundEvent::Message(message)).await;
        id
    }

    /// Presses a button carrying `payload` on message `on_message`.
    pub async fn press(&self, chat: i64, user: i64, payload: &str, on_message: Option<MessageId>) {
        let query = CallbackQuery {
            id: format!("cb-{}", self.next_message_id.fetch_add(1, Ordering::SeqCst)),
            chat_id: ChatId(chat),
            message_id: on_message,
            user_id: UserId(user),
            data: payload.to_string(),
        };
        self.bridge.handle_event(InboundEvent::Callback(query)).await;
    }

    /// Binds the test project to `chat` and opens a discussion owned by `owner`.
    pub async fn open_discussion(&self, chat: i64, owner: i64) {
        self.say(chat, owner, &format!("/set_project {TEST_PROJECT_ID}"))
            .await;
        self.say(chat, owner, "/start_discussion").await;
    }

    pub fn last_text(&self) -> String {
        self.channel
            .last_sent()
            .map(|s| s.message.content)
            .unwrap_or_default()
    }
}
