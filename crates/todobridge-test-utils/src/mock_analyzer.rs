// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock analysis adapter for deterministic testing.
//!
//! Results are popped from FIFO queues. When a queue is empty, `analyze`
//! returns a fixed task and `revise` puts the feedback into the
//! description.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use todobridge_core::types::AnalyzedTask;
use todobridge_core::{AdapterType, AnalysisAdapter, BridgeError, HealthStatus, PluginAdapter};

pub struct MockAnalyzer {
    analyses: Mutex<VecDeque<Result<AnalyzedTask, BridgeError>>>,
    revisions: Mutex<VecDeque<Result<AnalyzedTask, BridgeError>>>,
    analyze_inputs: Mutex<Vec<Vec<String>>>,
    revise_inputs: Mutex<Vec<(AnalyzedTask, String)>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self {
            analyses: Mutex::new(VecDeque::new()),
            revisions: Mutex::new(VecDeque::new()),
            analyze_inputs: Mutex::new(Vec::new()),
            revise_inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn push_analysis(&self, result: Result<AnalyzedTask, BridgeError>) {
        self.analyses.lock().unwrap().push_back(result);
    }

    pub fn push_revision(&self, result: Result<AnalyzedTask, BridgeError>) {
        self.revisions.lock().unwrap().push_back(result);
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_inputs.lock().unwrap().len()
    }

    pub fn last_analyze_input(&self) -> Option<Vec<String>> {
        self.analyze_inputs.lock().unwrap().last().cloned()
    }

    pub fn revise_calls(&self) -> usize {
        self.revise_inputs.lock().unwrap().len()
    }

    pub fn last_revise_input(&self) -> Option<(AnalyzedTask, String)> {
        self.revise_inputs.lock().unwrap().last().cloned()
    }

    /// The task `analyze` returns when nothing is queued.
    pub fn default_task() -> AnalyzedTask {
        AnalyzedTask {
            title: "Mock task".into(),
            description: "Generated by the mock analyzer".into(),
            due_date: None,
            priority: 1,
            labels: Vec::new(),
        }
    }
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockAnalyzer {
    fn name(&self) -> &str {
        "mock-analyzer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Analysis
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait]
impl AnalysisAdapter for MockAnalyzer {
    async fn analyze(&self, messages: &[String]) -> Result<AnalyzedTask, BridgeError> {
        self.analyze_inputs.lock().unwrap().push(messages.to_vec());
        let queued = self.analyses.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok(Self::default_task()))
    }

    async fn revise(
        &self,
        current: &AnalyzedTask,
        feedback: &str,
    ) -> Result<AnalyzedTask, BridgeError> {
        self.revise_inputs
            .lock()
            .unwrap()
            .push((current.clone(), feedback.to_string()));
        let queued = self.revisions.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            Ok(AnalyzedTask {
                description: feedback.to_string(),
                ..current.clone()
            })
        })
    }
}
