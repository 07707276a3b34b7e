// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task tracker adapter trait.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CreatedTaskRef, NewTask, Project, TaskUpdate, TrackerTask};

/// Adapter for the external task-tracking service.
///
/// Failures surface to the user as retryable. Implementations may retry
/// reads, but writes other than an idempotent create are sent once.
#[async_trait]
pub trait TaskTrackerAdapter: PluginAdapter {
    /// Creates a task. Repeated calls with the same `idempotency_key` must
    /// not produce a second task on the tracker side.
    async fn create_task(
        &self,
        task: &NewTask,
        idempotency_key: &str,
    ) -> Result<CreatedTaskRef, BridgeError>;

    /// Lists every project visible to the configured account.
    async fn list_projects(&self) -> Result<Vec<Project>, BridgeError>;

    /// Lists active tasks of a project.
    async fn list_tasks(&self, project_id: &str) -> Result<Vec<TrackerTask>, BridgeError>;

    async fn get_task(&self, task_id: &str) -> Result<TrackerTask, BridgeError>;

    async fn update_task(
        &self,
        task_id: &str,
        update: &TaskUpdate,
    ) -> Result<TrackerTask, BridgeError>;

    /// Marks a task completed.
    async fn close_task(&self, task_id: &str) -> Result<(), BridgeError>;

    async fn delete_task(&self, task_id: &str) -> Result<(), BridgeError>;
}
