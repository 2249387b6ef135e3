use memoir_core::model::{
    AudioRef, InterviewSettings, InterviewSettingsDraft, PhotoCategory, PhotoContext, StoryId,
    StoryMetadata, StoryRecord, VoiceSpeed,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Seeds are opaque bits; store them as the same 64 bits in a signed column.
pub(crate) fn seed_to_i64(seed: u64) -> i64 {
    i64::from_ne_bytes(seed.to_ne_bytes())
}

pub(crate) fn seed_from_i64(v: i64) -> u64 {
    u64::from_ne_bytes(v.to_ne_bytes())
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_story_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoryRecord, StorageError> {
    let id: StoryId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    let photo = row
        .try_get::<Option<String>, _>("photo_json")
        .map_err(ser)?
        .map(|raw| from_json::<PhotoContext>(&raw))
        .transpose()?;

    let category = row
        .try_get::<Option<String>, _>("category")
        .map_err(ser)?
        .map(|raw| raw.parse::<PhotoCategory>().map_err(ser))
        .transpose()?;

    let metadata = StoryMetadata {
        duration_secs: row
            .try_get::<Option<i64>, _>("duration_secs")
            .map_err(ser)?
            .map(|v| u32_from_i64("duration_secs", v))
            .transpose()?,
        word_count: row
            .try_get::<Option<i64>, _>("word_count")
            .map_err(ser)?
            .map(|v| u32_from_i64("word_count", v))
            .transpose()?,
        category,
        tags: from_json(&row.try_get::<String, _>("tags_json").map_err(ser)?)?,
        people: from_json(&row.try_get::<String, _>("people_json").map_err(ser)?)?,
    };

    StoryRecord::from_persisted(
        id,
        row.try_get("title").map_err(ser)?,
        row.try_get("narrative").map_err(ser)?,
        photo,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
        row.try_get::<Option<String>, _>("audio_ref")
            .map_err(ser)?
            .map(AudioRef::new),
        metadata,
    )
    .map_err(ser)
}

pub(crate) fn map_settings_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<InterviewSettings, StorageError> {
    let voice_speed: String = row.try_get("voice_speed").map_err(ser)?;
    let auto_play: i64 = row.try_get("auto_play").map_err(ser)?;

    InterviewSettingsDraft {
        question_count: Some(u32_from_i64(
            "question_count",
            row.try_get("question_count").map_err(ser)?,
        )?),
        turn_timeout_secs: Some(u32_from_i64(
            "turn_timeout_secs",
            row.try_get("turn_timeout_secs").map_err(ser)?,
        )?),
        optional_inclusion: Some(row.try_get("optional_inclusion").map_err(ser)?),
        auto_play: Some(auto_play != 0),
        voice_speed: Some(voice_speed.parse::<VoiceSpeed>().map_err(ser)?),
        selection_seed: row
            .try_get::<Option<i64>, _>("selection_seed")
            .map_err(ser)?
            .map(seed_from_i64),
        fallback_photo_description: Some(
            row.try_get("fallback_photo_description").map_err(ser)?,
        ),
    }
    .validate()
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_bits_survive_signed_column() {
        for seed in [0_u64, 42, u64::MAX, 1 << 63] {
            assert_eq!(seed_from_i64(seed_to_i64(seed)), seed);
        }
    }
}
