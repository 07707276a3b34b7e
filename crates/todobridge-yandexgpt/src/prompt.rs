// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction and tolerant parsing of the model's task JSON.

use serde::{Deserialize, Serialize};
use todobridge_core::BridgeError;
use todobridge_core::types::{AnalyzedTask, priority_label};

const CREATE_TASK_PROMPT: &str = r#"You are a task management assistant. Analyze the dialog and extract information for a Todoist task.

Response requirements:
1. Response must be in JSON format
2. All fields are required
3. Use Russian language for fields

JSON format:
{
  "title": "Brief, informative task title (max 100 characters)",
  "description": "Detailed task description, including all important details from the discussion",
  "due_date": "Due date in YYYY-MM-DD format or relative format (today, tomorrow, mon, tue, etc.). If no due date mentioned, leave empty string",
  "priority": "Priority from 1 to 4, where 1 is normal, 4 is urgent",
  "priority_text": "Text description of priority (Normal, Medium, High, Urgent)",
  "labels": ["list", "of", "relevant", "tags"]
}

Rules:
- Title should be specific and informative
- Description should include all technical details mentioned in the discussion
- For priority: use 4 only for truly urgent tasks
- Tags should be relevant to context (e.g.: frontend, backend, bug, feature, meeting)

Dialog to analyze:
"#;

const EDIT_TASK_PROMPT_HEAD: &str = "You are a task management assistant. Edit an existing task based on user feedback.

Requirements:
1. Change only the fields mentioned in the feedback
2. Keep all other fields unchanged
3. Response must be in JSON format
4. Use Russian language for fields

Current task:
";

const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Prompt asking the model to turn a discussion into a task.
pub fn analysis_prompt(messages: &[String]) -> String {
    format!(
        "{CREATE_TASK_PROMPT}\n{}\n\nResponse in JSON format:",
        messages.join("\n")
    )
}

/// Prompt asking the model to apply `feedback` to `current`.
pub fn revision_prompt(current: &AnalyzedTask, feedback: &str) -> Result<String, BridgeError> {
    let task_json =
        serde_json::to_string_pretty(&PromptTask::from(current)).map_err(|e| BridgeError::Internal(
            format!("failed to serialize task for revision: {e}"),
        ))?;
    Ok(format!(
        "{EDIT_TASK_PROMPT_HEAD}{task_json}\n\nUser feedback:\n{feedback}\n\nReturn the updated task in JSON format."
    ))
}

/// Task as shown to the model, mirroring the shape it is asked to return.
#[derive(Debug, Serialize)]
struct PromptTask<'a> {
    title: &'a str,
    description: &'a str,
    due_date: &'a str,
    priority: u8,
    priority_text: &'a str,
    labels: &'a [String],
}

impl<'a> From<&'a AnalyzedTask> for PromptTask<'a> {
    fn from(task: &'a AnalyzedTask) -> Self {
        Self {
            title: &task.title,
            description: &task.description,
            due_date: task.due_date.as_deref().unwrap_or(""),
            priority: task.priority,
            priority_text: priority_label(task.priority),
            labels: &task.labels,
        }
    }
}

/// The model's answer before normalization. Every field is optional and
/// priority may arrive as a number or a string.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTask {
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    priority: Option<serde_json::Value>,
    labels: Option<Vec<String>>,
}

fn analysis_err(message: impl Into<String>) -> BridgeError {
    BridgeError::Analysis {
        message: message.into(),
        source: None,
    }
}

/// Extract the task object from free-form model output.
///
/// The JSON object is taken from the first `{` to the last `}`. A missing
/// title is an error; other fields fall back to defaults and a priority
/// outside 1..=4 becomes 1.
pub fn parse_task(text: &str) -> Result<AnalyzedTask, BridgeError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(analysis_err("no JSON object found in model output"));
    };
    if end <= start {
        return Err(analysis_err("no JSON object found in model output"));
    }

    let raw: RawTask = serde_json::from_str(&text[start..=end]).map_err(|e| BridgeError::Analysis {
        message: format!("failed to parse model output: {e}"),
        source: Some(Box::new(e)),
    })?;

    let title = raw.title.map(|t| t.trim().to_string()).unwrap_or_default();
    if title.is_empty() {
        return Err(analysis_err("model output has no task title"));
    }

    let description = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let due_date = raw
        .due_date
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(AnalyzedTask {
        title,
        description,
        due_date,
        priority: normalize_priority(raw.priority.as_ref()),
        labels: raw.labels.unwrap_or_default(),
    })
}

fn normalize_priority(value: Option<&serde_json::Value>) -> u8 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(p @ 1..=4) => p as u8,
        _ => 1,
    }
}
