// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discussion-to-task workflow for Todobridge.
//!
//! The [`Dispatcher`] receives events from a chat transport and hands each
//! chat's events, in order, to the [`Bridge`]. The bridge routes them:
//! - slash commands to the [`commands`] registry
//! - ordinary text to the open session via [`SessionManager`]
//! - confirmation presses to the [`CallbackHandler`]
//! - replies to edit prompts to the [`Orchestrator`] as revision feedback

pub mod assignee;
pub mod bridge;
pub mod callback;
pub mod commands;
pub mod dates;
pub mod dispatcher;
pub mod edit_tracker;
pub mod orchestrator;
pub mod render;
pub mod session;
pub mod shutdown;

pub use bridge::Bridge;
pub use callback::{CallbackAction, CallbackHandler, CallbackOutcome};
pub use dispatcher::Dispatcher;
pub use edit_tracker::PendingEdits;
pub use orchestrator::Orchestrator;
pub use session::SessionManager;
