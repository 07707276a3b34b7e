// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` so the core can hold them as trait objects.

pub mod adapter;
pub mod analysis;
pub mod channel;
pub mod storage;
pub mod tracker;

pub use adapter::PluginAdapter;
pub use analysis::AnalysisAdapter;
pub use channel::ChannelAdapter;
pub use storage::StorageAdapter;
pub use tracker::TaskTrackerAdapter;
