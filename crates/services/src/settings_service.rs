use std::sync::Arc;

use memoir_core::model::{InterviewSettings, InterviewSettingsDraft};
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<InterviewSettings, SettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Validate and persist new settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if validation fails or persistence fails.
    pub async fn save(
        &self,
        draft: InterviewSettingsDraft,
    ) -> Result<InterviewSettings, SettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_settings(&settings).await?;
        Ok(settings)
    }
}
