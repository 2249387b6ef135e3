use std::sync::Arc;

use memoir_core::model::QuestionPool;
use storage::repository::Storage;

use crate::Clock;
use crate::capabilities::InterviewCapabilities;
use crate::error::AppServicesError;
use crate::interview::InterviewController;
use crate::settings_service::SettingsService;
use crate::story_service::StoryService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    stories: Arc<StoryService>,
    settings: Arc<SettingsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock))
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock) -> Self {
        let stories = Arc::new(StoryService::new(clock, Arc::clone(&storage.stories)));
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.settings)));
        Self {
            clock,
            storage,
            stories,
            settings,
        }
    }

    #[must_use]
    pub fn stories(&self) -> Arc<StoryService> {
        Arc::clone(&self.stories)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }

    /// Build an interview controller with the persisted settings and the
    /// stock question pool.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if settings cannot be loaded.
    pub async fn interview(
        &self,
        capabilities: InterviewCapabilities,
    ) -> Result<InterviewController, AppServicesError> {
        let settings = self.settings.load().await?;
        Ok(InterviewController::new(
            self.clock,
            settings,
            QuestionPool::standard(),
            capabilities,
            Arc::clone(&self.storage.stories),
        ))
    }
}
