// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions, one module per entity.

pub mod audit;
pub mod chats;
pub mod drafts;
pub mod messages;
pub mod sessions;
pub mod tasks;
