use async_trait::async_trait;
use memoir_core::model::{StoryId, StoryRecord};

use super::SqliteRepository;
use super::mapping::{map_story_row, to_json};
use crate::repository::{StorageError, StoryRepository};

const STORY_COLUMNS: &str = r"
    id, title, narrative, photo_json, created_at, updated_at, audio_ref,
    duration_secs, word_count, category, tags_json, people_json
";

#[async_trait]
impl StoryRepository for SqliteRepository {
    async fn save_story(&self, story: &StoryRecord) -> Result<(), StorageError> {
        let photo_json = story.photo().map(to_json).transpose()?;
        let metadata = story.metadata();

        sqlx::query(
            r"
                INSERT INTO stories (
                    id, title, narrative, photo_json, created_at, updated_at, audio_ref,
                    duration_secs, word_count, category, tags_json, people_json
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    narrative = excluded.narrative,
                    photo_json = excluded.photo_json,
                    updated_at = excluded.updated_at,
                    audio_ref = excluded.audio_ref,
                    duration_secs = excluded.duration_secs,
                    word_count = excluded.word_count,
                    category = excluded.category,
                    tags_json = excluded.tags_json,
                    people_json = excluded.people_json
            ",
        )
        .bind(story.id().to_string())
        .bind(story.title())
        .bind(story.narrative())
        .bind(photo_json)
        .bind(story.created_at())
        .bind(story.updated_at())
        .bind(story.audio().map(|a| a.as_str().to_string()))
        .bind(metadata.duration_secs.map(i64::from))
        .bind(metadata.word_count.map(i64::from))
        .bind(metadata.category.map(|c| c.as_str()))
        .bind(to_json(&metadata.tags)?)
        .bind(to_json(&metadata.people)?)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_story(&self, id: StoryId) -> Result<Option<StoryRecord>, StorageError> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_story_row).transpose()
    }

    async fn list_stories(&self) -> Result<Vec<StoryRecord>, StorageError> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_story_row(&row)?);
        }
        Ok(out)
    }

    async fn delete_story(&self, id: StoryId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM stories WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
