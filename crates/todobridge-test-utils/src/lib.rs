// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Todobridge integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without Telegram, Todoist or YandexGPT.
//!
//! # Components
//!
//! - [`MockChannel`] - chat transport with event injection and capture
//! - [`MockTaskTracker`] - in-memory task tracker with failure injection
//! - [`MockAnalyzer`] - analysis adapter with queued results
//! - [`TestHarness`] - a wired [`Bridge`](todobridge_agent::Bridge) over the mocks

pub mod harness;
pub mod mock_analyzer;
pub mod mock_channel;
pub mod mock_tracker;

use std::sync::Arc;

use todobridge_config::model::StorageConfig;
use todobridge_core::StorageAdapter;
use todobridge_storage::SqliteStorage;

pub use harness::{TEST_PROJECT_ID, TestHarness, TestHarnessBuilder};
pub use mock_analyzer::MockAnalyzer;
pub use mock_channel::{MockChannel, SentMessage};
pub use mock_tracker::MockTaskTracker;

/// Initialized SQLite storage in a fresh temp directory. Keep the
/// directory alive for as long as the storage is used.
pub async fn temp_storage() -> (Arc<dyn StorageAdapter>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("test.db");
    let storage = SqliteStorage::new(StorageConfig {
        database_path: path.to_string_lossy().into_owned(),
        wal_mode: true,
    });
    storage.initialize().await.expect("initialize temp storage");
    (Arc::new(storage), dir)
}
