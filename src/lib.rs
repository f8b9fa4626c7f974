//! Bullion Desk - Precious Metal and Currency Holdings Tracker
//!
//! Records purchases of gold and foreign currency, values them against a
//! live price feed and summarizes profit/loss per instrument.

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod feeds;
pub mod scheduler;
pub mod services;
pub mod state;

use anyhow::Context;
use cli::{Cli, Command};
use config::AppConfig;
use error::ErrorResponse;
use state::AppState;
use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
///
/// Output goes to the log file because stdout carries the tables.
fn init_logging(log_path: &Path) {
    let writer = log_path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(log_path));

    let (writer, fallback) = match writer {
        Ok(file) => (BoxMakeWriter::new(std::sync::Mutex::new(file)), None),
        Err(e) => (BoxMakeWriter::new(std::io::sink), Some(e)),
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bullion_desk=info,bullion_desk_lib=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init();

    if let Some(e) = fallback {
        eprintln!("Logging disabled: cannot open {}: {}", log_path.display(), e);
    }
}

/// Run one command to completion
async fn dispatch(state: &AppState, command: Command, json: bool) -> error::Result<()> {
    let output = match command {
        Command::List => commands::holdings::list_holdings(state, json)?,
        Command::Show => commands::groups::show_dashboard(state, json).await?,
        Command::Groups => commands::groups::show_groups(state, json)?,
        Command::Add(request) => commands::holdings::add_holding(state, request, json).await?,
        Command::Edit(request) => commands::holdings::edit_holding(state, request, json).await?,
        Command::Delete { id } => commands::holdings::delete_holding(state, id, json)?,
        Command::Refresh => commands::refresh::refresh_prices(state, json).await?,
        Command::Prices => commands::refresh::show_prices(state, json).await?,
        Command::Catalog => commands::catalog::show_catalog(json)?,
        Command::Watch => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            commands::refresh::watch(state, json, shutdown, |frame| {
                println!("{}\n", frame);
            })
            .await?;
            return Ok(());
        }
    };

    println!("{}", output);
    Ok(())
}

/// Load configuration, open the store and run one parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.log_path);

    tracing::info!("Starting Bullion Desk...");

    catalog::validate().context("Instrument catalog is invalid")?;

    let state =
        AppState::new(config, cli.offline).context("Failed to open the holdings database")?;

    match dispatch(&state, cli.command, cli.json).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
            } else {
                eprintln!("Error: {}", e);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
