// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! YandexGPT analysis adapter for Todobridge.
//!
//! Implements [`AnalysisAdapter`]: a discussion transcript goes in, a
//! structured task proposal comes out. Revisions send the current proposal
//! back together with the user's feedback.

pub mod client;
pub mod prompt;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use todobridge_config::model::AnalysisConfig;
use todobridge_core::error::BridgeError;
use todobridge_core::traits::{AnalysisAdapter, PluginAdapter};
use todobridge_core::types::{AdapterType, AnalyzedTask, HealthStatus};
use tracing::{debug, info};

use crate::client::YandexGptClient;
use crate::types::{CompletionMessage, CompletionOptions, CompletionRequest};

/// YandexGPT implementation of [`AnalysisAdapter`].
pub struct YandexAnalyzer {
    client: YandexGptClient,
    model_uri: String,
    temperature: f64,
    max_tokens: u32,
}

impl YandexAnalyzer {
    /// Builds the analyzer. Both `api_key` and `folder_id` must be set.
    pub fn new(config: &AnalysisConfig) -> Result<Self, BridgeError> {
        let api_key = required(&config.api_key, "analysis.api_key")?;
        let folder_id = required(&config.folder_id, "analysis.folder_id")?;

        let client = YandexGptClient::new(api_key, folder_id, Duration::from_secs(config.timeout_secs))?
            .with_base_url(config.base_url.clone());
        let model_uri = format!("gpt://{folder_id}/{}", config.model);

        info!(model = %model_uri, "YandexGPT analyzer initialized");
        Ok(Self {
            client,
            model_uri,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn request(&self, prompt: String) -> CompletionRequest {
        CompletionRequest {
            model_uri: self.model_uri.clone(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: self.temperature,
                max_tokens: self.max_tokens.to_string(),
            },
            messages: vec![CompletionMessage::user(prompt)],
        }
    }

    async fn run(&self, prompt: String) -> Result<AnalyzedTask, BridgeError> {
        let text = self.client.complete(&self.request(prompt)).await?;
        debug!(raw = %text, "model output received");
        let task = prompt::parse_task(&text)?;
        debug!(
            title = %task.title,
            priority = task.priority,
            due = task.due_date.as_deref().unwrap_or(""),
            "parsed task proposal"
        );
        Ok(task)
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, BridgeError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| BridgeError::Config(format!("{key} is required")))
}

#[async_trait]
impl PluginAdapter for YandexAnalyzer {
    fn name(&self) -> &str {
        "yandexgpt"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Analysis
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        // Completions are billed; do not spend tokens on health checks.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait]
impl AnalysisAdapter for YandexAnalyzer {
    async fn analyze(&self, messages: &[String]) -> Result<AnalyzedTask, BridgeError> {
        if messages.is_empty() {
            return Err(BridgeError::Analysis {
                message: "no messages to analyze".into(),
                source: None,
            });
        }
        self.run(prompt::analysis_prompt(messages)).await
    }

    async fn revise(
        &self,
        current: &AnalyzedTask,
        feedback: &str,
    ) -> Result<AnalyzedTask, BridgeError> {
        if feedback.trim().is_empty() {
            return Err(BridgeError::Analysis {
                message: "no feedback provided for editing".into(),
                source: None,
            });
        }
        self.run(prompt::revision_prompt(current, feedback)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(uri: &str) -> AnalysisConfig {
        AnalysisConfig {
            api_key: Some("key".into()),
            folder_id: Some("b1g".into()),
            base_url: uri.to_string(),
            ..AnalysisConfig::default()
        }
    }

    fn answer(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": {"alternatives": [{"message": {"role": "assistant", "text": text}}]}
        }))
    }

    #[test]
    fn missing_folder_is_a_config_error() {
        let mut cfg = config("http://localhost");
        cfg.folder_id = None;
        let err = YandexAnalyzer::new(&cfg).err().unwrap();
        assert!(err.to_string().contains("analysis.folder_id"));
    }

    #[tokio::test]
    async fn analyze_returns_parsed_task() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Dialog to analyze"))
            .and(body_string_contains("alice, [2026-10-17 10:00:00]: fix the login page"))
            .respond_with(answer(
                r#"{"title": "Починить логин", "description": "Страница входа", "due_date": "friday", "priority": 3, "labels": ["bug"]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let analyzer = YandexAnalyzer::new(&config(&server.uri())).unwrap();
        let task = analyzer
            .analyze(&["alice, [2026-10-17 10:00:00]: fix the login page".into()])
            .await
            .unwrap();
        assert_eq!(task.title, "Починить логин");
        assert_eq!(task.due_date.as_deref(), Some("friday"));
        assert_eq!(task.priority, 3);
    }

    #[tokio::test]
    async fn analyze_rejects_output_without_title() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(answer("Sorry, I cannot help with that."))
            .mount(&server)
            .await;

        let analyzer = YandexAnalyzer::new(&config(&server.uri())).unwrap();
        let err = analyzer.analyze(&["a: b".into()]).await.unwrap_err();
        assert!(matches!(err, BridgeError::Analysis { .. }));
    }

    #[tokio::test]
    async fn revise_sends_current_task_and_feedback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("User feedback"))
            .and(body_string_contains("make it urgent"))
            .respond_with(answer(r#"{"title": "Deploy", "description": "Roll out", "priority": 4}"#))
            .expect(1)
            .mount(&server)
            .await;

        let analyzer = YandexAnalyzer::new(&config(&server.uri())).unwrap();
        let current = AnalyzedTask {
            title: "Deploy".into(),
            description: "Roll out".into(),
            due_date: None,
            priority: 1,
            labels: vec![],
        };
        let revised = analyzer.revise(&current, "make it urgent").await.unwrap();
        assert_eq!(revised.priority, 4);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(answer("{}"))
            .expect(0)
            .mount(&server)
            .await;

        let analyzer = YandexAnalyzer::new(&config(&server.uri())).unwrap();
        assert!(analyzer.analyze(&[]).await.is_err());
        let current = AnalyzedTask {
            title: "t".into(),
            description: "d".into(),
            due_date: None,
            priority: 1,
            labels: vec![],
        };
        assert!(analyzer.revise(&current, "  ").await.is_err());
    }
}
