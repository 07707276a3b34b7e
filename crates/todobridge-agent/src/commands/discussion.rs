// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commands driving the discussion lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use todobridge_core::error::BridgeError;
use todobridge_core::types::{OutboundMessage, escape_markup};
use tracing::warn;

use super::{Command, CommandContext, CommandRegistry};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(Arc::new(StartCommand));
    registry.register(Arc::new(HelpCommand));
    registry.register(Arc::new(SetProjectCommand));
    registry.register(Arc::new(StartDiscussionCommand));
    registry.register(Arc::new(CancelCommand));
    registry.register(Arc::new(CreateTaskCommand { name: "create_task" }));
    registry.register(Arc::new(CreateTaskCommand { name: "analyze" }));
}

const WELCOME: &str = "🤖 **Welcome to the Todoist Assistant Bot!** 🤖\n\n\
    I turn group discussions into Todoist tasks.\n\n\
    • `/set_project <id or URL>` picks the Todoist project for this chat\n\
    • `/start_discussion` starts collecting messages\n\
    • `/create_task` drafts a task from the discussion\n\n\
    Type /help to see all available commands.";

const DISCUSSION_STARTED: &str = "Началось новое обсуждение задачи!\n\
    Все сообщения будут сохраняться до тех пор, пока вы не создадите задачу (/create_task) или не отмените процесс (/cancel)";

const DISCUSSION_RUNNING: &str =
    "Обсуждение уже идёт! Прежде, чем начать новое завершите текущее.";

const PROJECT_REQUIRED: &str =
    "Пожалуйста, сначала укажите идентификатор проекта, используя команду /set_project <id>";

struct StartCommand;

#[async_trait]
impl Command for StartCommand {
    fn name(&self) -> &str {
        "start"
    }

    fn description(&self) -> &str {
        "Start interacting with the bot"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        ctx.services.sessions.ensure_chat(ctx.chat_id).await?;
        Ok(ctx.reply(WELCOME))
    }
}

struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Show available commands"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        Ok(ctx.reply(ctx.registry.help_text()))
    }
}

struct SetProjectCommand;

#[async_trait]
impl Command for SetProjectCommand {
    fn name(&self) -> &str {
        "set_project"
    }

    fn usage(&self) -> &str {
        "<id or URL>"
    }

    fn description(&self) -> &str {
        "Choose the Todoist project for this chat"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        if ctx.args.is_empty() {
            return Ok(ctx.reply(
                "Please provide a project ID or URL. Usage: /set_project <id or URL>",
            ));
        }
        let project_id = ctx.services.sessions.set_project(ctx.chat_id, ctx.args).await?;
        Ok(ctx.reply(format!("Project ID set to: {}", escape_markup(&project_id))))
    }
}

struct StartDiscussionCommand;

#[async_trait]
impl Command for StartDiscussionCommand {
    fn name(&self) -> &str {
        "start_discussion"
    }

    fn description(&self) -> &str {
        "Start collecting messages for a new task"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        let user_id = ctx.require_user()?;
        let sessions = &ctx.services.sessions;
        if sessions.project_id(ctx.chat_id).await?.is_none() {
            return Ok(ctx.reply(PROJECT_REQUIRED));
        }
        match sessions.start(ctx.chat_id, user_id).await {
            Ok(_) => Ok(ctx.reply(DISCUSSION_STARTED)),
            Err(BridgeError::SessionAlreadyExists) => Ok(ctx.reply(DISCUSSION_RUNNING)),
            Err(e) => Err(e),
        }
    }
}

struct CancelCommand;

#[async_trait]
impl Command for CancelCommand {
    fn name(&self) -> &str {
        "cancel"
    }

    fn description(&self) -> &str {
        "Discard the current discussion"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        let services = ctx.services;
        let session = match services.sessions.active(ctx.chat_id).await {
            Ok(session) => session,
            Err(BridgeError::NoActiveSession) => {
                return Ok(ctx.reply("No active discussion to cancel."));
            }
            Err(e) => return Err(e),
        };
        if ctx.user_id.is_none() || session.owner_id != ctx.user_id {
            return Ok(ctx.reply("Only the user who started this discussion can cancel it."));
        }

        match services.sessions.close_session(&session).await {
            Ok(()) => {}
            Err(BridgeError::NoActiveSession) => {
                return Ok(ctx.reply("No active discussion to cancel."));
            }
            Err(e) => return Err(e),
        }
        services.pending_edits.forget_session(session.id);
        if let Err(e) = services.storage.delete_draft(session.id).await {
            warn!(session_id = %session.id, error = %e, "failed to delete draft of canceled session");
        }
        Ok(ctx.reply(
            "Discussion canceled. All collected messages have been discarded.",
        ))
    }
}

/// `/create_task` and its `/analyze` alias.
struct CreateTaskCommand {
    name: &'static str,
}

#[async_trait]
impl Command for CreateTaskCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        if self.name == "analyze" {
            "Analyze the discussion and draft a task"
        } else {
            "Draft a task from the current discussion"
        }
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        let user_id = ctx.require_user()?;
        ctx.services
            .orchestrator
            .create_task_from_discussion(ctx.chat_id, user_id)
            .await
    }
}
