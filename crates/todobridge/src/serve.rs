// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `todobridge serve`: wires storage, Todoist, YandexGPT and Telegram into
//! the bridge and runs the dispatcher until a shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use todobridge_agent::{Bridge, Dispatcher, shutdown};
use todobridge_config::model::BridgeConfig;
use todobridge_core::types::ChatId;
use todobridge_core::{
    BridgeError, ChannelAdapter, HealthStatus, PluginAdapter, StorageAdapter,
};
use todobridge_storage::SqliteStorage;
use todobridge_telegram::TelegramChannel;
use todobridge_todoist::TodoistTracker;
use todobridge_yandexgpt::YandexAnalyzer;
use tracing::{info, warn};

/// Runs the bot until SIGINT or SIGTERM.
pub async fn run_serve(config: BridgeConfig) -> Result<(), BridgeError> {
    init_tracing(&config.bot.log_level);

    info!(name = %config.bot.name, "starting todobridge serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let tracker = Arc::new(TodoistTracker::new(&config.todoist)?);
    let analyzer = Arc::new(YandexAnalyzer::new(&config.analysis)?);
    log_health(tracker.as_ref()).await;

    let mut telegram = TelegramChannel::new(&config.telegram)?;
    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);

    let bridge = Arc::new(Bridge::new(
        channel.clone(),
        storage.clone(),
        tracker,
        analyzer,
        &config.session,
    ));
    let dispatcher = Dispatcher::new(
        bridge,
        channel.clone(),
        config.telegram.allowed_chats.iter().copied().map(ChatId),
        Duration::from_secs(config.session.worker_idle_secs),
    );

    let cancel = shutdown::install_signal_handler();
    let result = dispatcher.run(cancel).await;

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage close failed");
    }

    result?;
    info!("todobridge serve shutdown complete");
    Ok(())
}

/// Startup reachability check. An unreachable collaborator is logged, not
/// fatal: the bot still captures discussions while it is down.
async fn log_health(adapter: &dyn PluginAdapter) {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => info!(adapter = adapter.name(), "adapter healthy"),
        Ok(status) => warn!(adapter = adapter.name(), ?status, "adapter not healthy"),
        Err(e) => warn!(adapter = adapter.name(), error = %e, "health check failed"),
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("todobridge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
