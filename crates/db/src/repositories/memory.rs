use std::collections::HashMap;

use tokio::sync::RwLock;

use kopibot_core::domain::user::{UserId, UserRecord};

use super::{RepositoryError, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserRepository {
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn save(&self, user: UserRecord) -> Result<UserId, RepositoryError> {
        let mut users = self.users.write().await;
        let id = user.id.clone();
        users.insert(id.clone(), user);
        Ok(id)
    }
}
