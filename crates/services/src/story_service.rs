use std::sync::Arc;

use memoir_core::model::{StoryId, StoryRecord};
use storage::repository::{StorageError, StoryRepository};
use tracing::info;

use crate::Clock;
use crate::error::StoryServiceError;

/// Browsing and light editing of saved stories.
#[derive(Clone)]
pub struct StoryService {
    clock: Clock,
    stories: Arc<dyn StoryRepository>,
}

impl StoryService {
    #[must_use]
    pub fn new(clock: Clock, stories: Arc<dyn StoryRepository>) -> Self {
        Self { clock, stories }
    }

    /// All stories, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoryServiceError::Storage` if the repository fails.
    pub async fn list(&self) -> Result<Vec<StoryRecord>, StoryServiceError> {
        Ok(self.stories.list_stories().await?)
    }

    /// # Errors
    ///
    /// Returns `StoryServiceError::Storage` if the repository fails.
    pub async fn get(&self, id: StoryId) -> Result<Option<StoryRecord>, StoryServiceError> {
        Ok(self.stories.get_story(id).await?)
    }

    /// # Errors
    ///
    /// Returns `StoryServiceError::Storage` with `StorageError::NotFound` if the
    /// story does not exist.
    pub async fn delete(&self, id: StoryId) -> Result<(), StoryServiceError> {
        self.stories.delete_story(id).await?;
        info!(story = %id, "story deleted");
        Ok(())
    }

    /// Give a story a new title.
    ///
    /// # Errors
    ///
    /// Returns `StoryServiceError::Story` for a blank title and
    /// `StoryServiceError::Storage` if the story is missing or cannot be saved.
    pub async fn rename(
        &self,
        id: StoryId,
        title: &str,
    ) -> Result<StoryRecord, StoryServiceError> {
        let mut story = self
            .stories
            .get_story(id)
            .await?
            .ok_or(StorageError::NotFound)?;
        story.rename(title, self.clock.now())?;
        self.stories.save_story(&story).await?;
        Ok(story)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoir_core::model::{NarrativeResult, StoryMetadata};
    use memoir_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn story(title: &str) -> StoryRecord {
        StoryRecord::new(
            StoryId::random(),
            NarrativeResult::new(title, "The smell of fresh bread filled the air.").unwrap(),
            None,
            None,
            StoryMetadata::default(),
            fixed_now(),
        )
    }

    #[tokio::test]
    async fn rename_bumps_updated_at() {
        let repo = Arc::new(InMemoryRepository::new());
        let saved = story("Draft");
        repo.save_story(&saved).await.unwrap();

        let later = fixed_now() + chrono::Duration::minutes(5);
        let service = StoryService::new(Clock::fixed(later), repo);
        let renamed = service
            .rename(saved.id(), "The Day My Bakery Opened")
            .await
            .unwrap();

        assert_eq!(renamed.title(), "The Day My Bakery Opened");
        assert_eq!(renamed.created_at(), fixed_now());
        assert_eq!(renamed.updated_at(), later);
        assert_eq!(service.get(saved.id()).await.unwrap(), Some(renamed));
    }

    #[tokio::test]
    async fn rename_rejects_blank_and_missing() {
        let repo = Arc::new(InMemoryRepository::new());
        let saved = story("Our Wedding Day");
        repo.save_story(&saved).await.unwrap();
        let service = StoryService::new(Clock::fixed(fixed_now()), repo);

        assert!(matches!(
            service.rename(saved.id(), "   ").await,
            Err(StoryServiceError::Story(_))
        ));
        assert!(matches!(
            service.rename(StoryId::random(), "Title").await,
            Err(StoryServiceError::Storage(StorageError::NotFound))
        ));
    }

    #[tokio::test]
    async fn delete_then_list() {
        let repo = Arc::new(InMemoryRepository::new());
        let a = story("Growing Up in the Countryside");
        repo.save_story(&a).await.unwrap();
        let service = StoryService::new(Clock::fixed(fixed_now()), repo);

        service.delete(a.id()).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
        assert!(service.delete(a.id()).await.is_err());
    }
}
