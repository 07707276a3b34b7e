// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the YandexGPT completion endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use todobridge_core::BridgeError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, CompletionRequest, CompletionResponse};

pub const API_BASE_URL: &str = "https://llm.api.cloud.yandex.net";
const COMPLETION_PATH: &str = "/foundationModels/v1/completion";

#[derive(Debug, Clone)]
pub struct YandexGptClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl YandexGptClient {
    /// Creates a client using API-key auth scoped to `folder_id`.
    pub fn new(api_key: &str, folder_id: &str, timeout: Duration) -> Result<Self, BridgeError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Api-Key {api_key}"))
            .map_err(|e| BridgeError::Config(format!("invalid YandexGPT API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            "x-folder-id",
            HeaderValue::from_str(folder_id)
                .map_err(|e| BridgeError::Config(format!("invalid folder id header value: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Analysis {
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

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sends a completion request and returns the first alternative's text.
    ///
    /// Retries once on 429/500/503 after a short delay.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, BridgeError> {
        let url = format!("{}{COMPLETION_PATH}", self.base_url);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_millis(500)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| self.transport_err(e))?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| BridgeError::Analysis {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let parsed: CompletionResponse =
                    serde_json::from_str(&body).map_err(|e| BridgeError::Analysis {
                        message: format!("failed to parse API response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return first_alternative(parsed);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("YandexGPT API error ({status}): {}", api_err.error.message),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(BridgeError::Analysis {
                message,
                source: None,
            });
        }

        Err(BridgeError::Analysis {
            message: "completion request failed after retries".into(),
            source: None,
        })
    }

    fn transport_err(&self, e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Timeout {
                duration: self.timeout,
            }
        } else {
            BridgeError::Analysis {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

fn first_alternative(response: CompletionResponse) -> Result<String, BridgeError> {
    let result = response.result.ok_or_else(|| BridgeError::Analysis {
        message: "response has no result".into(),
        source: None,
    })?;
    if let Some(usage) = &result.usage {
        debug!(
            input = usage.input_text_tokens.as_deref().unwrap_or("?"),
            completion = usage.completion_tokens.as_deref().unwrap_or("?"),
            "YandexGPT token usage"
        );
    }
    result
        .alternatives
        .into_iter()
        .next()
        .map(|alt| alt.message.text)
        .ok_or_else(|| BridgeError::Analysis {
            message: "no alternatives in response".into(),
            source: None,
        })
}

fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
