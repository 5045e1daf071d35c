pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use repositories::{RepositoryError, UserRepository};
pub use store::{open_user_repository, StoreError};
