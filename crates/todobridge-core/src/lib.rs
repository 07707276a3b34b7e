// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Todobridge.
//!
//! Holds the error type, the domain types and the adapter traits that the
//! store, the chat transport, the task tracker and the analysis service
//! implement.

pub mod error;
pub mod traits;
pub mod types;

pub use error::BridgeError;
pub use types::{AdapterType, ChatId, HealthStatus, MessageId, SessionId, UserId};

pub use traits::{
    AnalysisAdapter, ChannelAdapter, PluginAdapter, StorageAdapter, TaskTrackerAdapter,
};
