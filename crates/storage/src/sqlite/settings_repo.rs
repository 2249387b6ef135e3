use async_trait::async_trait;
use memoir_core::model::InterviewSettings;

use super::SqliteRepository;
use super::mapping::{map_settings_row, seed_to_i64};
use crate::repository::{SettingsRepository, StorageError};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<InterviewSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                question_count,
                turn_timeout_secs,
                optional_inclusion,
                auto_play,
                voice_speed,
                selection_seed,
                fallback_photo_description
            FROM interview_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_settings_row).transpose()
    }

    async fn save_settings(&self, settings: &InterviewSettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO interview_settings (
                id,
                question_count,
                turn_timeout_secs,
                optional_inclusion,
                auto_play,
                voice_speed,
                selection_seed,
                fallback_photo_description
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                question_count = excluded.question_count,
                turn_timeout_secs = excluded.turn_timeout_secs,
                optional_inclusion = excluded.optional_inclusion,
                auto_play = excluded.auto_play,
                voice_speed = excluded.voice_speed,
                selection_seed = excluded.selection_seed,
                fallback_photo_description = excluded.fallback_photo_description
            ",
        )
        .bind(1_i64)
        .bind(i64::from(settings.question_count()))
        .bind(i64::from(settings.turn_timeout_secs()))
        .bind(settings.optional_inclusion())
        .bind(i64::from(settings.auto_play()))
        .bind(settings.voice_speed().as_str())
        .bind(settings.selection_seed().map(seed_to_i64))
        .bind(settings.fallback_photo_description())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
