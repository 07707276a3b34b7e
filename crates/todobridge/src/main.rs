// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Todobridge: turns Telegram group discussions into Todoist tasks.

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use todobridge_config::{BridgeConfig, ConfigError};

/// Todobridge: turns Telegram group discussions into Todoist tasks.
#[derive(Parser, Debug)]
#[command(name = "todobridge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot until SIGINT or SIGTERM.
    Serve,
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<BridgeConfig, Vec<ConfigError>> {
    let config = match path {
        Some(path) => todobridge_config::load_and_validate_path(path)?,
        None => todobridge_config::load_and_validate()?,
    };
    todobridge_config::validate_credentials(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            todobridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            println!("configuration OK");
            println!("  database:      {}", config.storage.database_path);
            println!("  analysis:      {}", config.analysis.model);
            println!(
                "  allowed chats: {}",
                if config.telegram.allowed_chats.is_empty() {
                    "all".to_string()
                } else {
                    config.telegram.allowed_chats.len().to_string()
                }
            );
        }
        None => {
            println!("todobridge: use --help for available commands");
        }
    }
}
