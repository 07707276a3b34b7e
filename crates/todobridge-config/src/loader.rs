// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./todobridge.toml` > `~/.config/todobridge/todobridge.toml` >
//! `/etc/todobridge/todobridge.toml`, with `TODOBRIDGE_*` environment
//! variables overriding all files.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BridgeConfig;

/// Config sections, used to split env var names into `section.key`.
const SECTIONS: &[&str] = &["bot", "telegram", "todoist", "analysis", "storage", "session"];

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/todobridge/todobridge.toml`
/// 3. `~/.config/todobridge/todobridge.toml`
/// 4. `./todobridge.toml`
/// 5. `TODOBRIDGE_*` environment variables
pub fn load_config() -> Result<BridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file("/etc/todobridge/todobridge.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("todobridge/todobridge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("todobridge.toml"))
        .merge(env_provider())
}

/// Env provider mapping `TODOBRIDGE_<SECTION>_<KEY>` to `section.key`.
///
/// Only the first underscore after a known section name is turned into a
/// dot, so `TODOBRIDGE_TELEGRAM_BOT_TOKEN` becomes `telegram.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("TODOBRIDGE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section)
            && let Some(field) = rest.strip_prefix('_')
        {
            return format!("{section}.{field}");
        }
    }
    key
}
