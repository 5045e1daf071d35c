use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use kopibot_core::domain::user::{UserId, UserRecord};

use super::{RepositoryError, UserRepository};

/// One JSON document per user under `<root>/users/<id>.json`.
pub struct JsonFileUserRepository {
    users_dir: PathBuf,
}

impl JsonFileUserRepository {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let users_dir = root.as_ref().join("users");
        fs::create_dir_all(&users_dir).await?;
        debug!(
            event_name = "storage.json_file.opened",
            path = %users_dir.display(),
            "json file user store ready"
        );
        Ok(Self { users_dir })
    }

    fn record_path(&self, id: &UserId) -> Result<PathBuf, RepositoryError> {
        let key = id.as_str();
        let valid = !key.is_empty()
            && key.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(RepositoryError::InvalidKey(key.to_owned()));
        }
        Ok(self.users_dir.join(format!("{key}.json")))
    }
}

#[async_trait::async_trait]
impl UserRepository for JsonFileUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let path = self.record_path(id)?;
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|error| RepositoryError::Decode(format!("{}: {error}", path.display())))
    }

    async fn save(&self, user: UserRecord) -> Result<UserId, RepositoryError> {
        let path = self.record_path(&user.id)?;
        let encoded = serde_json::to_vec_pretty(&user)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        // Write-then-rename so a crash never leaves a truncated record behind.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, encoded).await?;
        fs::rename(&staging, &path).await?;
        Ok(user.id)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        let metadata = fs::metadata(&self.users_dir).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(RepositoryError::Decode(format!(
                "{} is not a directory",
                self.users_dir.display()
            )))
        }
    }
}
