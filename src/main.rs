//! fanout - send one prompt to several chat assistants in your own browser.
//!
//! Main entry point for the fanout CLI and server.

mod app;
mod cli;
mod commands;

use std::sync::OnceLock;

use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fanout_api::{AppState, InterfaceConfig, InterfaceServer};
use fanout_config::{ConfigLoader, LoggingConfig};

use crate::app::App;
use crate::cli::{Cli, Commands, ConfigAction};

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Console plus daily rolling file output. `RUST_LOG` wins over the
/// configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = logging.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("fanout")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

async fn run_server(
    app: App,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = InterfaceConfig::new(
        host.unwrap_or_else(|| app.config.server.host.clone()),
        port.unwrap_or(app.config.server.port),
    );
    let state = AppState::shared(app.coordinator.clone());
    let server = InterfaceServer::new(config, state);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ConfigLoader::load_or_default(&cli.config)?;
    init_tracing(&config.logging)?;

    let build = || App::build(config.clone());

    match cli.command.unwrap_or(Commands::Run {
        host: None,
        port: None,
    }) {
        Commands::Run { host, port } => run_server(build()?, host, port).await,
        Commands::Query {
            prompt,
            platforms,
            json,
        } => commands::query(&build()?, &prompt, platforms, json).await,
        Commands::Check { platform } => commands::check(&build()?, platform).await,
        Commands::Tabs => commands::tabs(&build()?).await,
        Commands::Platforms => commands::platforms(&build()?),
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_validate(&config),
            ConfigAction::Show => commands::config_show(&config),
        },
    }
}
