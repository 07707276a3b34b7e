// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes one inbound event to the component that owns it.
//!
//! Messages are checked in this order: a slash command, then a reply to a
//! pending edit prompt, then ordinary discussion content. Callback
//! presses go to the [`CallbackHandler`].

use std::sync::Arc;
use std::time::Duration;

use todobridge_config::model::SessionConfig;
use todobridge_core::error::BridgeError;
use todobridge_core::types::{ChatId, InboundEvent, InboundMessage, MessageId, OutboundMessage};
use todobridge_core::{AnalysisAdapter, ChannelAdapter, StorageAdapter, TaskTrackerAdapter};
use tracing::{debug, warn};

use crate::callback::CallbackHandler;
use crate::commands::{CommandContext, CommandRegistry, CommandServices, UNKNOWN_COMMAND, parse_command};
use crate::dates::reference_offset;
use crate::edit_tracker::{PendingEdit, PendingEdits};
use crate::orchestrator::Orchestrator;
use crate::session::SessionManager;

pub struct Bridge {
    channel: Arc<dyn ChannelAdapter>,
    services: CommandServices,
    registry: CommandRegistry,
    callbacks: CallbackHandler,
}

impl Bridge {
    /// Wires the bridge from its collaborators.
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        storage: Arc<dyn StorageAdapter>,
        tracker: Arc<dyn TaskTrackerAdapter>,
        analyzer: Arc<dyn AnalysisAdapter>,
        config: &SessionConfig,
    ) -> Self {
        let sessions = SessionManager::new(storage.clone(), tracker.clone());
        let pending_edits = Arc::new(PendingEdits::new(
            Duration::from_secs(config.edit_prompt_ttl_secs),
            config.max_pending_edits,
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            sessions.clone(),
            storage.clone(),
            analyzer,
            reference_offset(config.utc_offset_minutes),
        ));
        let callbacks = CallbackHandler::new(
            sessions.clone(),
            storage.clone(),
            tracker.clone(),
            channel.clone(),
            pending_edits.clone(),
        );

        Self {
            channel,
            services: CommandServices {
                sessions,
                orchestrator,
                storage,
                tracker,
                pending_edits,
            },
            registry: CommandRegistry::with_builtins(),
            callbacks,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.services.sessions
    }

    pub fn pending_edits(&self) -> &PendingEdits {
        &self.services.pending_edits
    }

    pub async fn handle_event(&self, event: InboundEvent) {
        match event {
            InboundEvent::Message(message) => self.handle_message(message).await,
            InboundEvent::Callback(query) => self.callbacks.handle(&query).await,
        }
    }

    async fn handle_message(&self, message: InboundMessage) {
        // Commands win even when sent as a reply to an edit prompt.
        if let Some((name, args)) = parse_command(&message.text) {
            self.handle_command(&message, name, args).await;
            return;
        }

        if let (Some(reply_to), Some(user_id)) = (message.reply_to, message.user_id)
            && let Some(pending) = self
                .services
                .pending_edits
                .lookup(message.chat_id, user_id, reply_to)
        {
            self.handle_edit_reply(&message, reply_to, pending).await;
            return;
        }

        if message.text.trim().is_empty() {
            return;
        }
        if let Err(e) = self
            .services
            .sessions
            .save_message(
                message.chat_id,
                message.message_id,
                message.user_id,
                message.username.as_deref(),
                &message.text,
            )
            .await
        {
            warn!(chat_id = %message.chat_id, message_id = %message.message_id, error = %e, "failed to capture message");
        }
    }

    async fn handle_command(&self, message: &InboundMessage, name: &str, args: &str) {
        debug!(chat_id = %message.chat_id, command = name, "command received");
        let Some(command) = self.registry.get(name) else {
            self.send(OutboundMessage::text(message.chat_id, UNKNOWN_COMMAND))
                .await;
            return;
        };

        let ctx = CommandContext {
            chat_id: message.chat_id,
            user_id: message.user_id,
            args,
            services: &self.services,
            registry: &self.registry,
        };
        match command.execute(&ctx).await {
            Ok(reply) => self.send(reply).await,
            Err(e) => self.report(message.chat_id, name, &e).await,
        }
    }

    async fn handle_edit_reply(&self, message: &InboundMessage, prompt_id: MessageId, pending: PendingEdit) {
        let feedback = message.text.trim();
        if feedback.is_empty() {
            return;
        }
        debug!(chat_id = %message.chat_id, session_id = %pending.session_id, "edit reply received");

        match self
            .services
            .orchestrator
            .revise(pending.session_id, feedback)
            .await
        {
            Ok(preview) => {
                self.services.pending_edits.remove(message.chat_id, prompt_id);
                self.send(preview).await;
            }
            Err(e) => {
                // A session that can no longer be revised will not recover.
                if e.is_precondition() {
                    self.services.pending_edits.remove(message.chat_id, prompt_id);
                }
                self.report(message.chat_id, "revise", &e).await;
            }
        }
    }

    /// Logs an error at the level its kind deserves and tells the chat.
    async fn report(&self, chat_id: ChatId, op: &str, e: &BridgeError) {
        if e.is_precondition() || e.is_protocol() {
            debug!(chat_id = %chat_id, op, error = %e, "request rejected");
        } else {
            warn!(chat_id = %chat_id, op, error = %e, "request failed");
        }
        self.send(OutboundMessage::text(chat_id, e.user_message()))
            .await;
    }

    async fn send(&self, message: OutboundMessage) {
        let chat_id = message.chat_id;
        if let Err(e) = self.channel.send(message).await {
            warn!(chat_id = %chat_id, error = %e, "failed to send message");
        }
    }
}
