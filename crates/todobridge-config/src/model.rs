// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level Todobridge configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Todoist API settings.
    #[serde(default)]
    pub todoist: TodoistConfig,

    /// YandexGPT analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Discussion session behavior.
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in the welcome text.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "Todobridge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chats the bot answers in. Empty means every chat.
    #[serde(default)]
    pub allowed_chats: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TodoistConfig {
    /// Personal API token.
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_todoist_base_url")]
    pub base_url: String,

    /// Deadline for a single API request.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_todoist_base_url(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_todoist_base_url() -> String {
    "https://api.todoist.com/rest/v2".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// YandexGPT API key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Yandex Cloud folder that owns the model.
    #[serde(default)]
    pub folder_id: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_analysis_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            folder_id: None,
            model: default_model(),
            base_url: default_analysis_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "yandexgpt-lite".to_string()
}

fn default_analysis_base_url() -> String {
    "https://llm.api.cloud.yandex.net".to_string()
}

fn default_temperature() -> f64 {
    0.3
}

fn default_max_tokens() -> u32 {
    2000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("todobridge").join("todobridge.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("todobridge.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Discussion session behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Offset of the reference timezone used to resolve relative due dates.
    /// Defaults to Moscow time (UTC+3).
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    /// How long an unanswered edit prompt keeps waiting for a reply.
    #[serde(default = "default_edit_prompt_ttl_secs")]
    pub edit_prompt_ttl_secs: u64,

    /// Upper bound on tracked edit prompts across all chats.
    #[serde(default = "default_max_pending_edits")]
    pub max_pending_edits: usize,

    /// Idle time after which a per-chat worker exits.
    #[serde(default = "default_worker_idle_secs")]
    pub worker_idle_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            edit_prompt_ttl_secs: default_edit_prompt_ttl_secs(),
            max_pending_edits: default_max_pending_edits(),
            worker_idle_secs: default_worker_idle_secs(),
        }
    }
}

fn default_utc_offset_minutes() -> i32 {
    180
}

fn default_edit_prompt_ttl_secs() -> u64 {
    3600
}

fn default_max_pending_edits() -> usize {
    1024
}

fn default_worker_idle_secs() -> u64 {
    600
}
