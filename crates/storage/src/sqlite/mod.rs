use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::repository::{SettingsRepository, Storage, StoryRepository};

mod mapping;
mod migrate;
mod settings_repo;
mod story_repo;

/// Stories and interview settings in one `SQLite` database.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error("invalid database url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("schema migration {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open (creating if missing) the database at `database_url`.
    ///
    /// Private in-memory databases get a single pooled connection so every
    /// query sees the same schema.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::InvalidUrl` for an unparsable URL and
    /// `SqliteInitError::Sqlx` if the pool cannot connect.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|source| SqliteInitError::InvalidUrl {
                url: database_url.to_string(),
                source,
            })?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let private_memory = database_url == "sqlite::memory:";
        let options = if private_memory {
            options
        } else {
            options.journal_mode(SqliteJournalMode::Wal)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(if private_memory { 1 } else { 4 })
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;
        info!(url = database_url, "story database opened");
        Ok(Self { pool })
    }

    /// Apply pending schema versions.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::Migration` naming the version that failed.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Open, migrate and wrap a `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connecting or migrating fails.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let stories: Arc<dyn StoryRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo);
        Ok(Self { stories, settings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[tokio::test]
    async fn private_memory_database_keeps_schema_across_queries() {
        let storage = Storage::sqlite("sqlite::memory:").await.unwrap();
        assert!(storage.stories.list_stories().await.unwrap().is_empty());
        assert!(storage.settings.get_settings().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unparsable_url_is_reported() {
        let err = SqliteRepository::connect("postgres://nope")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SqliteInitError::InvalidUrl { .. }));
    }
}
