// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory correlation of edit prompts with their sessions.
//!
//! When the owner presses "Edit", the bot sends a prompt and remembers the
//! prompt's message id. A later reply to exactly that message, from the same
//! user in the same chat, is revision feedback. Entries are process-local:
//! a restart forgets them and such replies become ordinary discussion text.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use todobridge_core::types::{ChatId, MessageId, SessionId, UserId};
use tracing::debug;

/// A prompt waiting for its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEdit {
    pub session_id: SessionId,
    pub chat_id: ChatId,
    pub user_id: UserId,
    created_at: Instant,
}

/// Bounded, expiring map from prompt message id to [`PendingEdit`].
///
/// Prompt ids are only unique within a chat, so the key carries both.
/// The lock is never held across an await.
#[derive(Debug)]
pub struct PendingEdits {
    entries: RwLock<HashMap<(ChatId, MessageId), PendingEdit>>,
    ttl: Duration,
    capacity: usize,
}

impl PendingEdits {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Remembers a prompt. Expired entries are purged first; if the map is
    /// still full, the oldest entry is evicted.
    pub fn track(
        &self,
        chat_id: ChatId,
        prompt_id: MessageId,
        session_id: SessionId,
        user_id: UserId,
    ) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| now.duration_since(entry.created_at) < self.ttl);

        if entries.len() >= self.capacity
            && let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(key, _)| *key)
        {
            debug!(chat_id = %oldest.0, prompt_id = %oldest.1, "evicting oldest edit prompt");
            entries.remove(&oldest);
        }

        entries.insert(
            (chat_id, prompt_id),
            PendingEdit {
                session_id,
                chat_id,
                user_id,
                created_at: now,
            },
        );
    }

    /// The live entry for a reply to `reply_to`, if it was sent by the user
    /// who requested the edit.
    pub fn lookup(&self, chat_id: ChatId, user_id: UserId, reply_to: MessageId) -> Option<PendingEdit> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(chat_id, reply_to))
            .filter(|entry| entry.user_id == user_id)
            .filter(|entry| entry.created_at.elapsed() < self.ttl)
            .copied()
    }

    /// Forgets a prompt once its reply has been applied.
    pub fn remove(&self, chat_id: ChatId, prompt_id: MessageId) -> Option<PendingEdit> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(chat_id, prompt_id))
    }

    /// Forgets every prompt of a session, e.g. when it closes.
    pub fn forget_session(&self, session_id: SessionId) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|_, entry| entry.session_id != session_id);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
