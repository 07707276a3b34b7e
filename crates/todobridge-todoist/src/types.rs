// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Todoist REST API v2.

use serde::{Deserialize, Serialize};
use todobridge_core::types::{NewTask, Project, TaskUpdate, TrackerTask};

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Exact date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Natural-language date the tracker parses itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_string: Option<String>,
}

impl From<&NewTask> for CreateTaskRequest {
    fn from(task: &NewTask) -> Self {
        let (due_date, due_string) = match task.due_date.as_deref().map(str::trim) {
            Some(due) if is_iso_date(due) => (Some(due.to_string()), None),
            Some(due) if !due.is_empty() => (None, Some(due.to_string())),
            _ => (None, None),
        };
        Self {
            content: task.content.clone(),
            description: task.description.clone(),
            project_id: task.project_id.clone(),
            labels: task.labels.clone(),
            priority: task.priority.filter(|p| (1..=4).contains(p)),
            due_date,
            due_string,
        }
    }
}

/// Body of `POST /tasks/{id}`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl From<&TaskUpdate> for UpdateTaskRequest {
    fn from(update: &TaskUpdate) -> Self {
        Self {
            content: update.content.clone(),
            description: update.description.clone(),
            priority: update.priority,
            due_string: update.due_string.clone(),
            labels: update.labels.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DueResponse {
    pub date: String,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskResponse {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub due: Option<DueResponse>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub is_completed: bool,
}

fn default_priority() -> u8 {
    1
}

impl From<TaskResponse> for TrackerTask {
    fn from(task: TaskResponse) -> Self {
        Self {
            id: task.id,
            content: task.content,
            description: task.description,
            url: task.url,
            due: task.due.map(|d| d.datetime.unwrap_or(d.date)),
            priority: task.priority,
            labels: task.labels,
            project_id: task.project_id,
            is_completed: task.is_completed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
}

impl From<ProjectResponse> for Project {
    fn from(project: ProjectResponse) -> Self {
        Self {
            id: project.id,
            name: project.name,
        }
    }
}

/// `YYYY-MM-DD` with digits in the right places.
pub(crate) fn is_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_due_dates_go_to_due_date() {
        let task = NewTask {
            content: "Ship".into(),
            project_id: "42".into(),
            due_date: Some("2026-10-19".into()),
            priority: Some(3),
            ..Default::default()
        };
        let request = CreateTaskRequest::from(&task);
        assert_eq!(request.due_date.as_deref(), Some("2026-10-19"));
        assert_eq!(request.due_string, None);
    }

    #[test]
    fn free_form_due_goes_to_due_string() {
        let task = NewTask {
            content: "Ship".into(),
            project_id: "42".into(),
            due_date: Some("end of month".into()),
            ..Default::default()
        };
        let request = CreateTaskRequest::from(&task);
        assert_eq!(request.due_date, None);
        assert_eq!(request.due_string.as_deref(), Some("end of month"));
    }

    #[test]
    fn out_of_range_priority_is_dropped() {
        let task = NewTask {
            content: "Ship".into(),
            project_id: "42".into(),
            priority: Some(9),
            ..Default::default()
        };
        let body = serde_json::to_value(CreateTaskRequest::from(&task)).unwrap();
        assert!(body.get("priority").is_none());
        assert!(body.get("description").is_none());
    }

    #[test]
    fn task_response_prefers_datetime() {
        let json = serde_json::json!({
            "id": "1",
            "content": "Call",
            "url": "https://todoist.com/showTask?id=1",
            "due": {"date": "2026-10-19", "datetime": "2026-10-19T10:00:00Z", "is_recurring": false}
        });
        let task: TrackerTask = serde_json::from_value::<TaskResponse>(json).unwrap().into();
        assert_eq!(task.due.as_deref(), Some("2026-10-19T10:00:00Z"));
        assert_eq!(task.priority, 1);
    }

    #[test]
    fn update_body_carries_only_set_fields() {
        let update = TaskUpdate {
            labels: Some(vec!["ops".into()]),
            ..Default::default()
        };
        let body = serde_json::to_value(UpdateTaskRequest::from(&update)).unwrap();
        assert_eq!(body, serde_json::json!({"labels": ["ops"]}));
    }

    #[test]
    fn iso_date_shape() {
        assert!(is_iso_date("2025-12-31"));
        assert!(!is_iso_date("2025-1-31"));
        assert!(!is_iso_date("tomorrow"));
    }
}
