use async_trait::async_trait;
use memoir_core::model::{InterviewSettings, StoryId, StoryRecord};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Key-addressed persistence for finished stories.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Insert the story, or replace the stored one with the same id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the story cannot be stored.
    async fn save_story(&self, story: &StoryRecord) -> Result<(), StorageError>;

    /// Fetch a story by id; `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn get_story(&self, id: StoryId) -> Result<Option<StoryRecord>, StorageError>;

    /// All stories, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn list_stories(&self) -> Result<Vec<StoryRecord>, StorageError>;

    /// Remove a story.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no story has this id.
    async fn delete_story(&self, id: StoryId) -> Result<(), StorageError>;
}

/// Single-row persistence for interview settings.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn get_settings(&self) -> Result<Option<InterviewSettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(&self, settings: &InterviewSettings) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    stories: Arc<Mutex<HashMap<StoryId, StoryRecord>>>,
    settings: Arc<Mutex<Option<InterviewSettings>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoryRepository for InMemoryRepository {
    async fn save_story(&self, story: &StoryRecord) -> Result<(), StorageError> {
        let mut guard = self
            .stories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(story.id(), story.clone());
        Ok(())
    }

    async fn get_story(&self, id: StoryId) -> Result<Option<StoryRecord>, StorageError> {
        let guard = self
            .stories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_stories(&self) -> Result<Vec<StoryRecord>, StorageError> {
        let guard = self
            .stories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut stories: Vec<StoryRecord> = guard.values().cloned().collect();
        stories.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(stories)
    }

    async fn delete_story(&self, id: StoryId) -> Result<(), StorageError> {
        let mut guard = self
            .stories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<InterviewSettings>, StorageError> {
        let guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_settings(&self, settings: &InterviewSettings) -> Result<(), StorageError> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(settings.clone());
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub stories: Arc<dyn StoryRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let stories: Arc<dyn StoryRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo);
        Self { stories, settings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoir_core::model::{NarrativeResult, StoryMetadata};
    use memoir_core::time::fixed_now;

    fn build_story(title: &str, minutes_after: i64) -> StoryRecord {
        StoryRecord::new(
            StoryId::random(),
            NarrativeResult::new(title, "A few warm words.").unwrap(),
            None,
            None,
            StoryMetadata::default(),
            fixed_now() + chrono::Duration::minutes(minutes_after),
        )
    }

    #[tokio::test]
    async fn save_is_an_upsert() {
        let repo = InMemoryRepository::new();
        let mut story = build_story("First", 0);
        repo.save_story(&story).await.unwrap();

        story.rename("Renamed", fixed_now()).unwrap();
        repo.save_story(&story).await.unwrap();

        let all = repo.list_stories().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title(), "Renamed");
    }

    #[tokio::test]
    async fn list_is_newest_first_and_delete_removes() {
        let repo = InMemoryRepository::new();
        let older = build_story("Older", 0);
        let newer = build_story("Newer", 10);
        repo.save_story(&older).await.unwrap();
        repo.save_story(&newer).await.unwrap();

        let titles: Vec<_> = repo
            .list_stories()
            .await
            .unwrap()
            .iter()
            .map(|s| s.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Newer", "Older"]);

        repo.delete_story(older.id()).await.unwrap();
        assert!(repo.get_story(older.id()).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_story(older.id()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn settings_are_absent_until_saved() {
        let storage = Storage::in_memory();
        assert!(storage.settings.get_settings().await.unwrap().is_none());

        let settings = InterviewSettings::default();
        storage.settings.save_settings(&settings).await.unwrap();
        assert_eq!(
            storage.settings.get_settings().await.unwrap(),
            Some(settings)
        );
    }
}
