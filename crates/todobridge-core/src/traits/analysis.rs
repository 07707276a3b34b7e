// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis adapter trait.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::AnalyzedTask;

/// Adapter for the language-model service that turns discussions into tasks.
#[async_trait]
pub trait AnalysisAdapter: PluginAdapter {
    /// Produces a task proposal from chronologically ordered message lines.
    ///
    /// Fails with [`BridgeError::Analysis`] when the model output cannot be
    /// parsed into a task with a title.
    async fn analyze(&self, messages: &[String]) -> Result<AnalyzedTask, BridgeError>;

    /// Applies free-text feedback to an existing proposal.
    async fn revise(
        &self,
        current: &AnalyzedTask,
        feedback: &str,
    ) -> Result<AnalyzedTask, BridgeError>;
}
