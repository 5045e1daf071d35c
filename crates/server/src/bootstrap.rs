use std::sync::Arc;

use kopibot_core::config::{AppConfig, AuthMode, ConfigError};
use kopibot_db::{open_user_repository, StoreError, UserRepository};
use kopibot_slack::reply::{LogReplySink, ReplySink, WebApiReplySink};
use kopibot_slack::socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner};
use kopibot_slack::{build_controller, BotContext, Controller};
use thiserror::Error;
use tracing::info;

/// Everything the process needs, built once at startup and passed down.
pub struct Application {
    pub config: AppConfig,
    pub users: Arc<dyn UserRepository>,
    pub controller: Arc<Controller>,
    pub slack_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("user store could not be opened: {0}")]
    Store(#[from] StoreError),
    #[error("route registration failed: {0}")]
    Routes(String),
}

#[cfg(test)]
pub async fn bootstrap(
    options: kopibot_core::config::LoadOptions,
) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        auth_mode = config.auth.label(),
        storage = config.storage.label(),
        "starting application bootstrap"
    );

    let users = open_user_repository(&config.storage).await?;
    info!(
        event_name = "system.bootstrap.storage_ready",
        correlation_id = "bootstrap",
        storage = config.storage.label(),
        "user store ready"
    );

    let context = BotContext::new(users.clone());
    let controller = Arc::new(
        build_controller(&context).map_err(|error| BootstrapError::Routes(error.to_string()))?,
    );
    info!(
        event_name = "system.bootstrap.controller_ready",
        correlation_id = "bootstrap",
        routes = controller.route_count(),
        handlers = controller.handler_count(),
        "controller registered"
    );

    let replies: Arc<dyn ReplySink> = match &config.auth {
        AuthMode::Integration { token } => Arc::new(WebApiReplySink::new(token.clone())),
        AuthMode::App { .. } => Arc::new(LogReplySink),
    };

    let slack_runner = SocketModeRunner::new(
        Arc::new(NoopSocketTransport),
        controller.clone(),
        replies,
        ReconnectPolicy::from(&config.transport),
    );

    Ok(Application { config, users, controller, slack_runner })
}
