// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Todoist task-tracker adapter for Todobridge.
//!
//! Implements [`TaskTrackerAdapter`] on top of the Todoist REST API v2.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use todobridge_config::model::TodoistConfig;
use todobridge_core::error::BridgeError;
use todobridge_core::traits::{PluginAdapter, TaskTrackerAdapter};
use todobridge_core::types::{
    AdapterType, CreatedTaskRef, HealthStatus, NewTask, Project, TaskUpdate, TrackerTask,
};
use tracing::info;

use crate::client::TodoistClient;
use crate::types::{CreateTaskRequest, UpdateTaskRequest};

/// Todoist implementation of [`TaskTrackerAdapter`].
pub struct TodoistTracker {
    client: TodoistClient,
}

impl TodoistTracker {
    /// Builds the tracker from config. Fails if no API token is configured.
    pub fn new(config: &TodoistConfig) -> Result<Self, BridgeError> {
        let token = config
            .api_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BridgeError::Config("todoist.api_token is required".into()))?;

        let client = TodoistClient::new(token, Duration::from_secs(config.timeout_secs))?
            .with_base_url(config.base_url.clone());

        info!(base_url = %config.base_url, "Todoist tracker initialized");
        Ok(Self { client })
    }

    pub fn from_client(client: TodoistClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for TodoistTracker {
    fn name(&self) -> &str {
        "todoist"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TaskTracker
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        match self.client.list_projects().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait]
impl TaskTrackerAdapter for TodoistTracker {
    async fn create_task(
        &self,
        task: &NewTask,
        idempotency_key: &str,
    ) -> Result<CreatedTaskRef, BridgeError> {
        let response = self
            .client
            .create_task(&CreateTaskRequest::from(task), idempotency_key)
            .await?;
        Ok(CreatedTaskRef {
            id: response.id,
            url: response.url,
        })
    }

    async fn list_projects(&self) -> Result<Vec<Project>, BridgeError> {
        let projects = self.client.list_projects().await?;
        Ok(projects.into_iter().map(Project::from).collect())
    }

    async fn list_tasks(&self, project_id: &str) -> Result<Vec<TrackerTask>, BridgeError> {
        let tasks = self.client.list_tasks(project_id).await?;
        Ok(tasks.into_iter().map(TrackerTask::from).collect())
    }

    async fn get_task(&self, task_id: &str) -> Result<TrackerTask, BridgeError> {
        Ok(self.client.get_task(task_id).await?.into())
    }

    async fn update_task(
        &self,
        task_id: &str,
        update: &TaskUpdate,
    ) -> Result<TrackerTask, BridgeError> {
        let response = self
            .client
            .update_task(task_id, &UpdateTaskRequest::from(update))
            .await?;
        Ok(response.into())
    }

    async fn close_task(&self, task_id: &str) -> Result<(), BridgeError> {
        self.client.close_task(task_id).await
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), BridgeError> {
        self.client.delete_task(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tracker(uri: &str) -> TodoistTracker {
        TodoistTracker::new(&TodoistConfig {
            api_token: Some("tok".into()),
            base_url: uri.to_string(),
            timeout_secs: 2,
        })
        .unwrap()
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let result = TodoistTracker::new(&TodoistConfig::default());
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[tokio::test]
    async fn create_task_maps_draft_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(body_partial_json(serde_json::json!({
                "content": "Deploy",
                "description": "Roll out v2",
                "project_id": "99",
                "due_date": "2026-10-19",
                "priority": 4
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "555",
                "content": "Deploy",
                "url": "https://todoist.com/showTask?id=555"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let task = NewTask {
            content: "Deploy".into(),
            description: "Roll out v2".into(),
            project_id: "99".into(),
            priority: Some(4),
            due_date: Some("2026-10-19".into()),
            labels: vec![],
        };
        let created = tracker(&server.uri())
            .create_task(&task, "session-1")
            .await
            .unwrap();
        assert_eq!(created.id, "555");
        assert_eq!(created.url, "https://todoist.com/showTask?id=555");
    }

    #[tokio::test]
    async fn list_projects_maps_to_domain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "1", "name": "Inbox", "color": "grey"},
                {"id": "2", "name": "Work"}
            ])))
            .mount(&server)
            .await;

        let tracker = tracker(&server.uri());
        let projects = tracker.list_projects().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].name, "Work");
        assert_eq!(tracker.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn health_check_reports_unhealthy_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let status = tracker(&server.uri()).health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }
}
