use std::sync::Arc;

use anyhow::{Result, bail};

use super::StorageInstance;
use super::sqlite::SqliteStorage;

pub async fn create_storage_from_connection_string(
    connection_string: &str,
) -> Result<Arc<dyn StorageInstance>> {
    Ok(match connection_string {
        s if s.starts_with("sqlite:") => Arc::new(SqliteStorage::connect(s).await?),

        s if s.starts_with("postgres:") || s.starts_with("postgresql:") => {
            bail!("PostgreSQL storage backend is not available in this build")
        }

        _ => bail!("Unsupported storage type: {}", connection_string),
    })
}
