use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

/// Ordered schema versions; each entry runs in one transaction.
const MIGRATIONS: &[(i64, &[&str])] = &[(
    1,
    &[
        r"
        CREATE TABLE IF NOT EXISTS stories (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            narrative TEXT NOT NULL,
            photo_json TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            audio_ref TEXT,
            duration_secs INTEGER CHECK (duration_secs >= 0),
            word_count INTEGER CHECK (word_count >= 0),
            category TEXT,
            tags_json TEXT NOT NULL DEFAULT '[]',
            people_json TEXT NOT NULL DEFAULT '[]'
        )
        ",
        r"
        CREATE TABLE IF NOT EXISTS interview_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            question_count INTEGER NOT NULL CHECK (question_count > 0),
            turn_timeout_secs INTEGER NOT NULL CHECK (turn_timeout_secs > 0),
            optional_inclusion REAL NOT NULL,
            auto_play INTEGER NOT NULL,
            voice_speed TEXT NOT NULL,
            selection_seed INTEGER,
            fallback_photo_description TEXT NOT NULL
        )
        ",
        "CREATE INDEX IF NOT EXISTS idx_stories_created ON stories (created_at, id)",
    ],
)];

/// Applies schema versions that are not yet recorded in `schema_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    for &(version, statements) in MIGRATIONS {
        apply(pool, version, statements)
            .await
            .map_err(|source| SqliteInitError::Migration { version, source })?;
    }
    Ok(())
}

async fn apply(pool: &SqlitePool, version: i64, statements: &[&str]) -> Result<(), sqlx::Error> {
    let applied = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
        .bind(version)
        .fetch_optional(pool)
        .await?
        .is_some();
    if applied {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for statement in statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
        .bind(version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(version, "applied sqlite migration");
    Ok(())
}
