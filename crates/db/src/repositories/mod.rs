use async_trait::async_trait;
use thiserror::Error;

use kopibot_core::domain::user::{UserId, UserRecord};

pub mod json_file;
pub mod memory;
pub mod user;

pub use json_file::JsonFileUserRepository;
pub use memory::InMemoryUserRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("file store error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("user id `{0}` cannot be used as a storage key")]
    InvalidKey(String),
}

/// Key-value persistence port for user records, keyed by platform user ID.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;
    async fn save(&self, user: UserRecord) -> Result<UserId, RepositoryError>;

    /// Cheap readiness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
