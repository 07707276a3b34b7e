// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Direct Todoist task management commands.

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use todobridge_core::error::BridgeError;
use todobridge_core::types::{
    NewTask, OutboundMessage, TaskUpdate, TrackerTask, escape_markup, priority_label,
};
use tracing::info;
use uuid::Uuid;

use super::{Command, CommandContext, CommandRegistry, is_valid_task_id};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(Arc::new(ListCommand));
    registry.register(Arc::new(ProjectsCommand));
    registry.register(Arc::new(ViewCommand));
    registry.register(Arc::new(CompleteCommand));
    registry.register(Arc::new(DeleteCommand));
    registry.register(Arc::new(DeleteConfirmCommand));
    registry.register(Arc::new(CreateCommand));
    registry.register(Arc::new(UpdateCommand));
}

fn usage_error(ctx: &CommandContext<'_>, problem: &str, usage: &str) -> OutboundMessage {
    ctx.reply(format!("⚠️ **Error:** {problem}\n\nUsage: `{usage}`"))
}

/// The single task id argument, or the usage reply to send instead.
fn task_id_arg<'a>(ctx: &CommandContext<'a>, usage: &str) -> Result<&'a str, OutboundMessage> {
    let id = ctx.args.split_whitespace().next().unwrap_or("");
    if id.is_empty() {
        return Err(usage_error(ctx, "Task ID is required", usage));
    }
    if !is_valid_task_id(id) {
        return Err(usage_error(ctx, "Invalid task ID", usage));
    }
    Ok(id)
}

struct ListCommand;

#[async_trait]
impl Command for ListCommand {
    fn name(&self) -> &str {
        "list"
    }

    fn usage(&self) -> &str {
        "[project_id]"
    }

    fn description(&self) -> &str {
        "List active tasks of the chat's project"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        let project_id = match ctx.args.split_whitespace().next() {
            Some(id) => id.to_string(),
            None => ctx
                .services
                .sessions
                .project_id(ctx.chat_id)
                .await?
                .ok_or(BridgeError::ProjectNotSet)?,
        };

        let tasks = ctx.services.tracker.list_tasks(&project_id).await?;
        if tasks.is_empty() {
            return Ok(ctx.reply(format!(
                "No tasks found in project {}.",
                escape_markup(&project_id)
            )));
        }

        let mut text = format!("📝 **Tasks in project {}:**\n\n", escape_markup(&project_id));
        for task in tasks.iter().filter(|t| !t.is_completed) {
            let _ = writeln!(text, "⬜ **{}**", escape_markup(&task.content));
            let _ = writeln!(text, "  ID: `{}`", escape_markup(&task.id));
            if let Some(due) = &task.due {
                let _ = writeln!(text, "  Due: {}", escape_markup(due));
            }
            text.push('\n');
        }
        text.push_str("Use /view <task_id> for details or /complete <task_id> to close a task.");
        Ok(ctx.reply(text))
    }
}

struct ProjectsCommand;

#[async_trait]
impl Command for ProjectsCommand {
    fn name(&self) -> &str {
        "projects"
    }

    fn description(&self) -> &str {
        "List your Todoist projects"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        let projects = ctx.services.tracker.list_projects().await?;
        if projects.is_empty() {
            return Ok(ctx.reply("No projects found."));
        }
        let mut text = String::from("📋 **Your Projects:**\n\n");
        for project in &projects {
            let _ = writeln!(text, "• **{}**", escape_markup(&project.name));
            let _ = writeln!(text, "  ID: `{}`\n", escape_markup(&project.id));
        }
        text.push_str("Use /set_project <id> to bind one to this chat.");
        Ok(ctx.reply(text))
    }
}

fn task_details(task: &TrackerTask) -> String {
    let mut text = String::from("📝 **Task Details**\n\n");
    let _ = writeln!(text, "**Title:** {}", escape_markup(&task.content));
    let _ = writeln!(text, "**ID:** `{}`", escape_markup(&task.id));
    if !task.description.is_empty() {
        let _ = writeln!(text, "**Description:** {}", escape_markup(&task.description));
    }
    if let Some(due) = &task.due {
        let _ = writeln!(text, "**Due:** {}", escape_markup(due));
    }
    let _ = writeln!(text, "**Priority:** {}", priority_label(task.priority));
    let _ = writeln!(text, "**Project:** {}", escape_markup(&task.project_id));
    if !task.labels.is_empty() {
        let _ = writeln!(text, "**Labels:** {}", escape_markup(&task.labels.join(", ")));
    }
    let _ = write!(text, "\n[Open in Todoist]({})", escape_markup(&task.url));
    text
}

struct ViewCommand;

#[async_trait]
impl Command for ViewCommand {
    fn name(&self) -> &str {
        "view"
    }

    fn usage(&self) -> &str {
        "<task_id>"
    }

    fn description(&self) -> &str {
        "Show task details"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        let task_id = match task_id_arg(ctx, "/view task_id") {
            Ok(id) => id,
            Err(reply) => return Ok(reply),
        };
        let task = ctx.services.tracker.get_task(task_id).await?;
        Ok(ctx.reply(task_details(&task)))
    }
}

struct CompleteCommand;

#[async_trait]
impl Command for CompleteCommand {
    fn name(&self) -> &str {
        "complete"
    }

    fn usage(&self) -> &str {
        "<task_id>"
    }

    fn description(&self) -> &str {
        "Mark a task as complete"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        let task_id = match task_id_arg(ctx, "/complete task_id") {
            Ok(id) => id,
            Err(reply) => return Ok(reply),
        };
        let tracker = &ctx.services.tracker;
        let task = tracker.get_task(task_id).await?;
        tracker.close_task(task_id).await?;
        info!(chat_id = %ctx.chat_id, task_id, "task completed");
        Ok(ctx.reply(format!(
            "✅ **Task completed successfully!**\n\n**Task:** {}",
            escape_markup(&task.content)
        )))
    }
}

struct DeleteCommand;

#[async_trait]
impl Command for DeleteCommand {
    fn name(&self) -> &str {
        "delete"
    }

    fn usage(&self) -> &str {
        "<task_id>"
    }

    fn description(&self) -> &str {
        "Delete a task (asks for confirmation)"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        let task_id = match task_id_arg(ctx, "/delete task_id") {
            Ok(id) => id,
            Err(reply) => return Ok(reply),
        };
        let task = ctx.services.tracker.get_task(task_id).await?;
        let mut text = String::from("🗑️ **Confirm Delete**\n\n");
        let _ = writeln!(text, "**Task:** {}", escape_markup(&task.content));
        let _ = writeln!(text, "**ID:** {}", escape_markup(&task.id));
        if let Some(due) = &task.due {
            let _ = writeln!(text, "**Due:** {}", escape_markup(due));
        }
        let _ = write!(
            text,
            "\nTo confirm deletion, reply with `/delete_confirm {}`\nTo cancel, simply ignore this message.",
            escape_markup(&task.id)
        );
        Ok(ctx.reply(text))
    }
}

struct DeleteConfirmCommand;

#[async_trait]
impl Command for DeleteConfirmCommand {
    fn name(&self) -> &str {
        "delete_confirm"
    }

    fn usage(&self) -> &str {
        "<task_id>"
    }

    fn description(&self) -> &str {
        "Delete a task for good"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        let task_id = match task_id_arg(ctx, "/delete_confirm task_id") {
            Ok(id) => id,
            Err(reply) => return Ok(reply),
        };
        ctx.services.tracker.delete_task(task_id).await?;
        info!(chat_id = %ctx.chat_id, task_id, "task deleted");
        Ok(ctx.reply(format!(
            "✅ **Task deleted successfully!**\n\n**ID:** {}",
            escape_markup(task_id)
        )))
    }
}

struct CreateCommand;

#[async_trait]
impl Command for CreateCommand {
    fn name(&self) -> &str {
        "create"
    }

    fn usage(&self) -> &str {
        "<title>"
    }

    fn description(&self) -> &str {
        "Create a task in the chat's project"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        if ctx.args.is_empty() {
            return Ok(usage_error(ctx, "Task title is required", "/create Task name"));
        }
        let project_id = ctx
            .services
            .sessions
            .project_id(ctx.chat_id)
            .await?
            .ok_or(BridgeError::ProjectNotSet)?;

        let request = NewTask {
            content: ctx.args.to_string(),
            project_id,
            ..Default::default()
        };
        let created = ctx
            .services
            .tracker
            .create_task(&request, &Uuid::new_v4().to_string())
            .await?;
        info!(chat_id = %ctx.chat_id, task_id = %created.id, "task created by command");

        Ok(ctx.reply(format!(
            "✅ **Task created successfully!**\n\n**Title:** [{}]({})\n**ID:** `{}`",
            escape_markup(ctx.args),
            escape_markup(&created.url),
            escape_markup(&created.id)
        )))
    }
}

/// Parses `priority=` values: digits, names and `pN` forms. Unknown values
/// mean normal priority.
fn parse_priority(value: &str) -> u8 {
    match value.to_lowercase().as_str() {
        "2" | "medium" | "p2" => 2,
        "3" | "high" | "p3" => 3,
        "4" | "urgent" | "p4" => 4,
        _ => 1,
    }
}

/// Builds an update from `field=value` pairs, returning the names of the
/// fields it touched. Unknown fields and malformed pairs are skipped.
fn parse_update<'a>(pairs: impl Iterator<Item = &'a str>) -> (TaskUpdate, Vec<&'static str>) {
    let mut update = TaskUpdate::default();
    let mut fields = Vec::new();
    for pair in pairs {
        let Some((field, value)) = pair.split_once('=') else {
            continue;
        };
        let touched = match field.to_lowercase().as_str() {
            "content" | "title" => {
                update.content = Some(value.to_string());
                "content"
            }
            "description" | "desc" => {
                update.description = Some(value.to_string());
                "description"
            }
            "due" | "due_string" => {
                update.due_string = Some(value.to_string());
                "due date"
            }
            "priority" | "prio" => {
                update.priority = Some(parse_priority(value));
                "priority"
            }
            "labels" | "label" => {
                update.labels = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|label| !label.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
                "labels"
            }
            _ => continue,
        };
        if !fields.contains(&touched) {
            fields.push(touched);
        }
    }
    (update, fields)
}

struct UpdateCommand;

#[async_trait]
impl Command for UpdateCommand {
    fn name(&self) -> &str {
        "update"
    }

    fn usage(&self) -> &str {
        "<task_id> field=value ..."
    }

    fn description(&self) -> &str {
        "Update content, description, due, priority or labels of a task"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<OutboundMessage, BridgeError> {
        const USAGE: &str = "/update task_id field=value [field2=value2...]";
        let mut args = ctx.args.split_whitespace();
        let task_id = args.next().unwrap_or("");
        if task_id.is_empty() {
            return Ok(usage_error(ctx, "Missing arguments", USAGE));
        }
        if !is_valid_task_id(task_id) {
            return Ok(usage_error(ctx, "Invalid task ID", USAGE));
        }

        let (update, fields) = parse_update(args);
        if update.is_empty() {
            return Ok(ctx.reply(
                "⚠️ **Error:** No valid fields to update\n\n\
                 Supported fields: content, description, due, priority, labels",
            ));
        }

        let tracker = &ctx.services.tracker;
        tracker.get_task(task_id).await?;
        let task = tracker.update_task(task_id, &update).await?;
        info!(chat_id = %ctx.chat_id, task_id, "task updated");

        Ok(ctx.reply(format!(
            "✅ **Task updated successfully!**\n\n**Task:** {}\n**Updated fields:** {}\n\nView details with: /view {}",
            escape_markup(&task.content),
            fields.join(", "),
            escape_markup(&task.id)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_names() {
        assert_eq!(parse_priority("urgent"), 4);
        assert_eq!(parse_priority("P3"), 3);
        assert_eq!(parse_priority("2"), 2);
        assert_eq!(parse_priority("whatever"), 1);
    }

    #[test]
    fn update_pairs() {
        let (update, fields) =
            parse_update(["title=Ship", "prio=high", "bogus", "color=red", "due=friday"].into_iter());
        assert_eq!(update.content.as_deref(), Some("Ship"));
        assert_eq!(update.priority, Some(3));
        assert_eq!(update.due_string.as_deref(), Some("friday"));
        assert_eq!(update.description, None);
        assert_eq!(fields, vec!["content", "priority", "due date"]);
    }

    #[test]
    fn update_labels_split_on_commas() {
        let (update, fields) = parse_update(["labels=ops,,backend,"].into_iter());
        assert_eq!(update.labels, Some(vec!["ops".to_string(), "backend".to_string()]));
        assert_eq!(fields, vec!["labels"]);

        let (cleared, _) = parse_update(["label="].into_iter());
        assert_eq!(cleared.labels, Some(vec![]));
    }

    #[test]
    fn update_without_known_fields_is_empty() {
        let (update, fields) = parse_update(["x=1"].into_iter());
        assert!(update.is_empty());
        assert!(fields.is_empty());
    }

    #[test]
    fn details_escape_task_text() {
        let task = TrackerTask {
            id: "7001".into(),
            content: "Fix *all* the things".into(),
            description: String::new(),
            url: "https://todoist.com/showTask?id=7001".into(),
            due: Some("2026-10-20".into()),
            priority: 4,
            labels: vec!["ops".into()],
            project_id: "2203306141".into(),
            is_completed: false,
        };
        let text = task_details(&task);
        assert!(text.contains("**Title:** Fix \\*all\\* the things"));
        assert!(text.contains("**Priority:** Urgent"));
        assert!(!text.contains("**Description:**"));
        assert!(text.ends_with("[Open in Todoist](https://todoist.com/showTask?id=7001)"));
    }
}
