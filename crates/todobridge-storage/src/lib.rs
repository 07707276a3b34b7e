// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Todobridge.
//!
//! WAL-mode SQLite with embedded refinery migrations, serialized access
//! through `tokio-rusqlite`, and typed queries for chats, sessions,
//! messages, drafts, created tasks and the revision audit trail.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
