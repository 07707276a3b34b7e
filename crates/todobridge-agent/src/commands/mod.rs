// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-command trait and registry.
//!
//! A [`Command`] answers one `/name` with one reply. The [`CommandRegistry`]
//! resolves names (including the `/name@botname` form used in groups) and
//! generates the `/help` text in registration order.

pub mod discussion;
pub mod tasks;

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use todobridge_core::error::BridgeError;
use todobridge_core::types::{ChatId, OutboundMessage, UserId};
use todobridge_core::{StorageAdapter, TaskTrackerAdapter};

use crate::edit_tracker::PendingEdits;
use crate::orchestrator::Orchestrator;
use crate::session::SessionManager;

pub const UNKNOWN_COMMAND: &str = "Unknown command. Use /help to see available commands.";

/// Collaborators shared by every command.
#[derive(Clone)]
pub struct CommandServices {
    pub sessions: SessionManager,
    pub orchestrator: Arc<Orchestrator>,
    pub storage: Arc<dyn StorageAdapter>,
    pub tracker: Arc<dyn TaskTrackerAdapter>,
    pub pending_edits: Arc<PendingEdits>,
}

/// One invocation of a command.
pub struct CommandContext<'a> {
    pub chat_id: ChatId,
    pub user_id: Option<UserId>,
    pub args: &'a str,
    pub services: &'a CommandServices,
    pub registry: &'a CommandRegistry,
}

impl CommandContext<'_> {
    /// The invoking user. Commands that act on ownership need one.
    pub fn require_user(&self) -> Result<UserId, BridgeError> {
        self.user_id.ok_or(BridgeError::NotOwner)
    }

    pub fn reply(&self, content: impl Into<String>) -> OutboundMessage {
        OutboundMessage::text(self.chat_id, content)
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    /// Name without the leading slash.
    fn name(&self) -> &str;

    /// Argument synopsis for `/help`, empty when the command takes none.
    fn usage(&self) -> &str {
        ""
    }

    fn description(&self) -> &str;

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError>;
}

/// Splits `/name@bot args` into `("name", "args")`. Returns `None` for
/// anything that is not a command.
pub fn parse_command(text: &str) -> Option<(&str, &str)> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (head, args) = match rest.find(char::is_whitespace) {
        Some(pos) => (&rest[..pos], rest[pos..].trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some((name, args))
}

/// Registered commands, looked up by name.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Every built-in command, in help order.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        discussion::register(&mut registry);
        tasks::register(&mut registry);
        registry
    }

    /// Registers a command. A later registration under the same name wins.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name().to_lowercase();
        match self.index.get(&name) {
            Some(&pos) => self.commands[pos] = command,
            None => {
                self.index.insert(name, self.commands.len());
                self.commands.push(command);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.index
            .get(&name.to_lowercase())
            .map(|&pos| self.commands[pos].clone())
    }

    pub fn help_text(&self) -> String {
        let mut text = String::from("**Available commands:**\n\n");
        for command in &self.commands {
            let usage = command.usage();
            if usage.is_empty() {
                let _ = writeln!(text, "/{} - {}", command.name(), command.description());
            } else {
                let _ = writeln!(
                    text,
                    "/{} {} - {}",
                    command.name(),
                    usage,
                    command.description()
                );
            }
        }
        text
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Task ids are Todoist's opaque alphanumeric strings.
pub(crate) fn is_valid_task_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}
