// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory task tracker for deterministic testing.
//!
//! Behaves like Todoist where tests care: projects are listed, tasks get
//! sequential ids and URLs, and a repeated idempotency key returns the
//! task it first created. Failures can be injected per operation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use todobridge_core::types::{CreatedTaskRef, NewTask, Project, TaskUpdate, TrackerTask};
use todobridge_core::{AdapterType, BridgeError, HealthStatus, PluginAdapter, TaskTrackerAdapter};

const FIRST_TASK_ID: u64 = 7001;

pub struct MockTaskTracker {
    projects: Mutex<Vec<Project>>,
    tasks: Mutex<Vec<TrackerTask>>,
    by_key: Mutex<HashMap<String, CreatedTaskRef>>,
    create_requests: Mutex<Vec<(NewTask, String)>>,
    next_id: AtomicU64,
    fail_create: AtomicBool,
    fail_projects: AtomicBool,
}

impl MockTaskTracker {
    pub fn new() -> Self {
        Self {
            projects: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            by_key: Mutex::new(HashMap::new()),
            create_requests: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(FIRST_TASK_ID),
            fail_create: AtomicBool::new(false),
            fail_projects: AtomicBool::new(false),
        }
    }

    /// A tracker knowing the given `(id, name)` projects.
    pub fn with_projects(projects: &[(&str, &str)]) -> Self {
        let tracker = Self::new();
        *tracker.projects.lock().unwrap() = projects
            .iter()
            .map(|(id, name)| Project {
                id: (*id).to_string(),
                name: (*name).to_string(),
            })
            .collect();
        tracker
    }

    /// Makes `create_task` fail until reset.
    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Makes `list_projects` fail until reset.
    pub fn fail_projects(&self, fail: bool) {
        self.fail_projects.store(fail, Ordering::SeqCst);
    }

    /// Every `create_task` call that reached the tracker, failed or not.
    pub fn create_calls(&self) -> usize {
        self.create_requests.lock().unwrap().len()
    }

    pub fn create_requests(&self) -> Vec<(NewTask, String)> {
        self.create_requests.lock().unwrap().clone()
    }

    /// Number of distinct tasks actually created.
    pub fn created_count(&self) -> usize {
        self.by_key.lock().unwrap().len()
    }

    pub fn task(&self, id: &str) -> Option<TrackerTask> {
        self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    /// Seeds a task directly, bypassing `create_task`.
    pub fn insert_task(&self, task: TrackerTask) {
        self.tasks.lock().unwrap().push(task);
    }

    fn not_found(op: &str, id: &str) -> BridgeError {
        BridgeError::TaskTracker {
            message: format!("{op} failed with status 404 Not Found: task {id}"),
            source: None,
        }
    }
}

impl Default for MockTaskTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTaskTracker {
    fn name(&self) -> &str {
        "mock-tracker"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TaskTracker
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait]
impl TaskTrackerAdapter for MockTaskTracker {
    async fn create_task(
        &self,
        task: &NewTask,
        idempotency_key: &str,
    ) -> Result<CreatedTaskRef, BridgeError> {
        self.create_requests
            .lock()
            .unwrap()
            .push((task.clone(), idempotency_key.to_string()));

        if self.fail_create.load(Ordering::SeqCst) {
            return Err(BridgeError::TaskTracker {
                message: "create task failed with status 503 Service Unavailable".into(),
                source: None,
            });
        }

        let mut by_key = self.by_key.lock().unwrap();
        if let Some(existing) = by_key.get(idempotency_key) {
            return Ok(existing.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let url = format!("https://todoist.com/showTask?id={id}");
        self.tasks.lock().unwrap().push(TrackerTask {
            id: id.clone(),
            content: task.content.clone(),
            description: task.description.clone(),
            url: url.clone(),
            due: task.due_date.clone(),
            priority: task.priority.unwrap_or(1),
            labels: task.labels.clone(),
            project_id: task.project_id.clone(),
            is_completed: false,
        });
        let created = CreatedTaskRef { id, url };
        by_key.insert(idempotency_key.to_string(), created.clone());
        Ok(created)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, BridgeError> {
        if self.fail_projects.load(Ordering::SeqCst) {
            return Err(BridgeError::TaskTracker {
                message: "list projects failed with status 500 Internal Server Error".into(),
                source: None,
            });
        }
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn list_tasks(&self, project_id: &str) -> Result<Vec<TrackerTask>, BridgeError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.project_id == project_id && !t.is_completed)
            .cloned()
            .collect())
    }

    async fn get_task(&self, task_id: &str) -> Result<TrackerTask, BridgeError> {
        self.task(task_id)
            .ok_or_else(|| Self::not_found("get task", task_id))
    }

    async fn update_task(
        &self,
        task_id: &str,
        update: &TaskUpdate,
    ) -> Result<TrackerTask, BridgeError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| Self::not_found("update task", task_id))?;
        if let Some(content) = &update.content {
            task.content = content.clone();
        }
        if let Some(description) = &update.description {
            task.description = description.clone();
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(due) = &update.due_string {
            task.due = Some(due.clone());
        }
        if let Some(labels) = &update.labels {
            task.labels = labels.clone();
        }
        Ok(task.clone())
    }

    async fn close_task(&self, task_id: &str) -> Result<(), BridgeError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| Self::not_found("close task", task_id))?;
        task.is_completed = true;
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), BridgeError> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        if tasks.len() == before {
            return Err(Self::not_found("delete task", task_id));
        }
        Ok(())
    }
}
