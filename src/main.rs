//! Taskboard
//!
//! Web server and command-line entry point for the personal task tracker.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use taskboard::cli::{Cli, Command, SummaryArgs};
use taskboard::config::Config;
use taskboard::db::Database;
use taskboard::error::AppError;
use taskboard::logging::{self, LogTarget};
use taskboard::motivation::OsRandomPicker;
use taskboard::stats::dashboard_view;
use taskboard::web::{AppState, start_server};
use tracing::{debug, info};

/// Resolve configuration, then apply command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::resolve(cli.config.as_deref().map(Path::new))?;

    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    Ok(config)
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path).with_context(|| {
        format!(
            "Failed to open database {}",
            config.server.db_path.display()
        )
    })?;

    let purged = db.purge_expired_sessions(Utc::now())?;
    if purged > 0 {
        debug!(purged, "Removed expired sessions");
    }

    Ok(db)
}

async fn serve(db: Database, config: Config) -> Result<()> {
    let addr = config.bind_addr()?;
    let state = AppState::new(Arc::new(db), Arc::new(config));
    let handle = start_server(state, addr).await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    handle.shutdown().await;
    Ok(())
}

fn summary(db: &Database, args: &SummaryArgs) -> Result<()> {
    let user = db
        .get_user_by_username(&args.user)?
        .ok_or_else(|| AppError::user_not_found(&args.user))?;

    let tasks = db.list_tasks(user.id)?;
    let view = dashboard_view(tasks, Utc::now(), &OsRandomPicker);

    let json = if args.pretty {
        serde_json::to_string_pretty(&view)?
    } else {
        serde_json::to_string(&view)?
    };
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let config = load_config(&cli)?;
    debug!(?config, "Configuration loaded");

    let db = open_database(&config)?;
    info!("Database: {}", config.server.db_path.display());

    match &cli.command {
        None | Some(Command::Serve) => serve(db, config).await,
        Some(Command::Summary(args)) => summary(&db, args),
    }
}
