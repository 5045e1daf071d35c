use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

use kopibot_core::config::StorageConfig;

use crate::repositories::{
    JsonFileUserRepository, RepositoryError, SqlUserRepository, UserRepository,
};
use crate::{connect, migrations};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unsupported store uri scheme `{scheme}` (expected `sqlite:`)")]
    UnsupportedUri { scheme: String },
    #[error("store connection failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("store migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Opens the user store selected by configuration.
pub async fn open_user_repository(
    storage: &StorageConfig,
) -> Result<Arc<dyn UserRepository>, StoreError> {
    match storage {
        StorageConfig::External { uri } => {
            let uri = uri.expose_secret();
            let scheme = uri.split(':').next().unwrap_or_default().to_ascii_lowercase();
            if scheme != "sqlite" {
                return Err(StoreError::UnsupportedUri { scheme });
            }

            let pool = connect(uri).await.map_err(StoreError::Connect)?;
            migrations::run_pending(&pool).await.map_err(StoreError::Migration)?;
            info!(event_name = "storage.opened", backend = "sqlite", "user store connected");
            Ok(Arc::new(SqlUserRepository::new(pool)))
        }
        StorageConfig::JsonFile { path } => {
            let repository = JsonFileUserRepository::open(path).await?;
            info!(
                event_name = "storage.opened",
                backend = "json_file",
                path = %path.display(),
                "user store opened"
            );
            Ok(Arc::new(repository))
        }
    }
}
