// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Every check runs; all problems are reported together.

use crate::diagnostic::ConfigError;
use crate::model::BridgeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate semantic constraints serde cannot express.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        invalid(format!(
            "bot.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.bot.log_level
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    for (key, url) in [
        ("todoist.base_url", &config.todoist.base_url),
        ("analysis.base_url", &config.analysis.base_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            invalid(format!("{key} must be an http(s) URL, got `{url}`"));
        }
    }

    for (key, secs) in [
        ("todoist.timeout_secs", config.todoist.timeout_secs),
        ("analysis.timeout_secs", config.analysis.timeout_secs),
        ("session.edit_prompt_ttl_secs", config.session.edit_prompt_ttl_secs),
        ("session.worker_idle_secs", config.session.worker_idle_secs),
    ] {
        if secs == 0 {
            invalid(format!("{key} must be greater than 0"));
        }
    }

    if !(0.0..=1.0).contains(&config.analysis.temperature) {
        invalid(format!(
            "analysis.temperature must be between 0.0 and 1.0, got {}",
            config.analysis.temperature
        ));
    }

    if config.analysis.max_tokens == 0 {
        invalid("analysis.max_tokens must be greater than 0".to_string());
    }

    // Real-world offsets span UTC-12:00 to UTC+14:00.
    if !(-12 * 60..=14 * 60).contains(&config.session.utc_offset_minutes) {
        invalid(format!(
            "session.utc_offset_minutes must be between -720 and 840, got {}",
            config.session.utc_offset_minutes
        ));
    }

    if config.session.max_pending_edits == 0 {
        invalid("session.max_pending_edits must be greater than 0".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Check that every credential the bot needs to run is present.
///
/// Kept apart from [`validate_config`] so that `check-config` and tests can
/// validate a partial file.
pub fn validate_credentials(config: &BridgeConfig) -> Result<(), Vec<ConfigError>> {
    let required = [
        ("telegram.bot_token", &config.telegram.bot_token),
        ("todoist.api_token", &config.todoist.api_token),
        ("analysis.api_key", &config.analysis.api_key),
        ("analysis.folder_id", &config.analysis.folder_id),
    ];

    let errors: Vec<ConfigError> = required
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(key, _)| ConfigError::MissingKey {
            key: key.to_string(),
        })
        .collect();

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&BridgeConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_problems() {
        let mut config = BridgeConfig::default();
        config.bot.log_level = "loud".into();
        config.analysis.temperature = 1.5;
        config.session.utc_offset_minutes = 2000;
        config.todoist.timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn credentials_missing_by_default() {
        let errors = validate_credentials(&BridgeConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn blank_credentials_are_missing() {
        let mut config = BridgeConfig::default();
        config.telegram.bot_token = Some("123:ABC".into());
        config.todoist.api_token = Some("  ".into());
        config.analysis.api_key = Some("key".into());
        config.analysis.folder_id = Some("folder".into());

        let errors = validate_credentials(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("todoist.api_token"));
    }
}
