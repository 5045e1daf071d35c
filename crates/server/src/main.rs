mod bootstrap;
mod health;

use std::process::ExitCode;

use anyhow::Result;
use kopibot_core::config::{AppConfig, AuthMode, LoadOptions};

fn init_logging(config: &AppConfig) {
    use kopibot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<()> {
    // Credentials are checked here, before logging or storage exist.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    if let AuthMode::App { port, .. } = &app.config.auth {
        health::spawn(*port, app.users.clone(), app.config.storage.label()).await?;
    }

    tracing::info!(
        event_name = "system.server.slack_transport_mode",
        correlation_id = "bootstrap",
        transport_mode = app.slack_runner.transport_label(),
        auth_mode = app.config.auth.label(),
        routes = app.controller.route_count(),
        handlers = app.controller.handler_count(),
        "slack runner transport mode initialized"
    );

    app.slack_runner.start().await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        "kopibot started"
    );
    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "kopibot stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
