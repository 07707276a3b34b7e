// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Todoist REST API v2.
//!
//! Every request carries a bounded timeout. Reads, and task creation carrying
//! an `X-Request-Id`, are retried once on transient statuses; other writes are
//! not retried.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use todobridge_core::BridgeError;
use tracing::{debug, warn};

use crate::types::{
    CreateTaskRequest, ProjectResponse, TaskResponse, UpdateTaskRequest,
};

/// Base URL of the Todoist REST API.
pub const API_BASE_URL: &str = "https://api.todoist.com/rest/v2";

/// Header Todoist uses to deduplicate writes.
const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Clone)]
pub struct TodoistClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl TodoistClient {
    /// Creates a client authenticated with a personal API token.
    pub fn new(api_token: &str, timeout: Duration) -> Result<Self, BridgeError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_token}"))
            .map_err(|e| BridgeError::Config(format!("invalid Todoist token header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::TaskTracker {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            timeout,
            max_retries: 1,
        })
    }

    /// Points the client at another server (self-hosted proxy, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn create_task(
        &self,
        request: &CreateTaskRequest,
        request_id: &str,
    ) -> Result<TaskResponse, BridgeError> {
        let response = self
            .execute("create task", true, || {
                self.client
                    .post(self.url("/tasks"))
                    .header(REQUEST_ID_HEADER, request_id)
                    .json(request)
            })
            .await?;
        parse_json("create task", response).await
    }

    pub async fn list_tasks(&self, project_id: &str) -> Result<Vec<TaskResponse>, BridgeError> {
        let response = self
            .execute("list tasks", true, || {
                self.client
                    .get(self.url(&format!("/tasks?project_id={project_id}")))
            })
            .await?;
        parse_json("list tasks", response).await
    }

    pub async fn get_task(&self, task_id: &str) -> Result<TaskResponse, BridgeError> {
        let response = self
            .execute("get task", true, || {
                self.client.get(self.url(&format!("/tasks/{task_id}")))
            })
            .await?;
        parse_json("get task", response).await
    }

    pub async fn update_task(
        &self,
        task_id: &str,
        request: &UpdateTaskRequest,
    ) -> Result<TaskResponse, BridgeError> {
        let response = self
            .execute("update task", false, || {
                self.client
                    .post(self.url(&format!("/tasks/{task_id}")))
                    .json(request)
            })
            .await?;
        parse_json("update task", response).await
    }

    /// Marks a task completed. Todoist answers 204 No Content.
    pub async fn close_task(&self, task_id: &str) -> Result<(), BridgeError> {
        self.execute("close task", false, || {
            self.client.post(self.url(&format!("/tasks/{task_id}/close")))
        })
        .await?;
        Ok(())
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<(), BridgeError> {
        self.execute("delete task", false, || {
            self.client.delete(self.url(&format!("/tasks/{task_id}")))
        })
        .await?;
        Ok(())
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectResponse>, BridgeError> {
        let response = self
            .execute("list projects", true, || self.client.get(self.url("/projects")))
            .await?;
        parse_json("list projects", response).await
    }

    /// Sends the request built by `build`, retrying transient failures when
    /// `retryable`. Non-2xx answers become [`BridgeError::TaskTracker`].
    async fn execute<F>(&self, op: &str, retryable: bool, build: F) -> Result<Response, BridgeError>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_retries = if retryable { self.max_retries } else { 0 };
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                warn!(op, attempt, "retrying Todoist request after transient error");
                tokio::time::sleep(Duration::from_millis(500)).await;
            }

            let response = build().send().await.map_err(|e| self.transport_err(op, e))?;
            let status = response.status();
            debug!(op, status = %status, attempt, "Todoist response received");

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < max_retries {
                warn!(op, status = %status, body = %body, "transient Todoist error, will retry");
                attempt += 1;
                continue;
            }

            return Err(BridgeError::TaskTracker {
                message: format!("{op} failed with status {status}: {body}"),
                source: None,
            });
        }
    }

    fn transport_err(&self, op: &str, e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Timeout {
                duration: self.timeout,
            }
        } else {
            BridgeError::TaskTracker {
                message: format!("{op}: HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

async fn parse_json<T: DeserializeOwned>(op: &str, response: Response) -> Result<T, BridgeError> {
    let body = response.text().await.map_err(|e| BridgeError::TaskTracker {
        message: format!("{op}: failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })?;
    serde_json::from_str(&body).map_err(|e| BridgeError::TaskTracker {
        message: format!("{op}: failed to parse response: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Statuses worth one more try.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> TodoistClient {
        TodoistClient::new("todo-token", Duration::from_secs(2))
            .unwrap()
            .with_base_url(base_url)
    }

    fn task_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "content": "Fix login",
            "description": "Users cannot log in",
            "url": format!("https://todoist.com/showTask?id={id}"),
            "priority": 3,
            "labels": [],
            "project_id": "2203306141",
            "is_completed": false
        })
    }

    #[tokio::test]
    async fn create_task_sends_token_request_id_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(header("authorization", "Bearer todo-token"))
            .and(header("x-request-id", "req-1"))
            .and(body_partial_json(serde_json::json!({
                "content": "Fix login",
                "project_id": "2203306141",
                "priority": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task_json("7001")))
            .expect(1)
            .mount(&server)
            .await;

        let request = CreateTaskRequest {
            content: "Fix login".into(),
            project_id: "2203306141".into(),
            priority: Some(3),
            ..Default::default()
        };
        let task = test_client(&server.uri())
            .create_task(&request, "req-1")
            .await
            .unwrap();
        assert_eq!(task.id, "7001");
    }

    #[tokio::test]
    async fn create_task_retries_transient_error_with_same_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(header("x-request-id", "req-2"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(header("x-request-id", "req-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(task_json("7002")))
            .mount(&server)
            .await;

        let request = CreateTaskRequest {
            content: "Fix login".into(),
            project_id: "1".into(),
            ..Default::default()
        };
        let task = test_client(&server.uri())
            .create_task(&request, "req-2")
            .await
            .unwrap();
        assert_eq!(task.id, "7002");
    }

    #[tokio::test]
    async fn list_tasks_filters_by_project() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("project_id", "42"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([task_json("1"), task_json("2")])),
            )
            .mount(&server)
            .await;

        let tasks = test_client(&server.uri()).list_tasks("42").await.unwrap();
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn close_and_delete_accept_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks/5/close"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/tasks/5"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.close_task("5").await.unwrap();
        client.delete_task("5").await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/tasks/5"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).delete_task("5").await.unwrap_err();
        assert!(err.to_string().contains("500"), "got: {err}");
    }

    #[tokio::test]
    async fn client_error_reports_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).list_projects().await.unwrap_err();
        match err {
            BridgeError::TaskTracker { message, .. } => {
                assert!(message.contains("403"));
                assert!(message.contains("Forbidden"));
            }
            other => panic!("expected TaskTracker error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = TodoistClient::new("t", Duration::from_millis(50))
            .unwrap()
            .with_base_url(server.uri());
        let err = client.list_projects().await.unwrap_err();
        assert!(matches!(err, BridgeError::Timeout { .. }), "got: {err:?}");
    }
}
