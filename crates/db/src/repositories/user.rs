use sqlx::Row;

use kopibot_core::domain::user::{UserId, UserRecord};

use super::{RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, counter
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<UserRecord, RepositoryError> {
            Ok(UserRecord {
                id: UserId(row.try_get("id")?),
                name: row.try_get("name")?,
                counter: row.try_get("counter")?,
            })
        })
        .transpose()
    }

    async fn save(&self, user: UserRecord) -> Result<UserId, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, counter)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, counter = excluded.counter
            "#,
        )
        .bind(user.id.as_str())
        .bind(user.name.as_deref())
        .bind(user.counter)
        .execute(&self.pool)
        .await?;

        Ok(user.id)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
