//! Emby organizer - entry point
//!
//! `run` performs a single reconciliation and prints the report; `daemon`
//! (the default) keeps the scheduler and optional control API running until
//! Ctrl-C.

use std::process::ExitCode;

use clap::Parser;

use emby_organizer::app::App;
use emby_organizer::cli::{Cli, Command};
use emby_organizer::config::Config;
use emby_organizer::error::OrganizeError;
use emby_organizer::services::{LogFormat, OrganizerService, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env())?;

    let cli = Cli::parse();
    let config = cli.apply(Config::from_env()?);

    match cli.command.clone().unwrap_or(Command::Daemon { once: false }) {
        Command::Run => run_once(config).await,
        Command::Daemon { .. } => {
            tracing::info!("Starting Emby organizer");
            let app = App::start(config).await?;

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutting down");
            app.shutdown().await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_once(config: Config) -> anyhow::Result<ExitCode> {
    let notifications = emby_organizer::app::build_notifications(&config)?;
    let organizer = OrganizerService::new(config, notifications);

    match organizer.run_once().await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(OrganizeError::Config(e)) => {
            eprintln!("{}", e);
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e.into()),
    }
}
