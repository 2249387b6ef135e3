use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::StoryId;
use crate::model::photo::{PhotoCategory, PhotoContext};
use crate::model::transcript::AudioRef;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoryError {
    #[error("story title cannot be empty")]
    EmptyTitle,

    #[error("story narrative cannot be empty")]
    EmptyNarrative,

    #[error("updated_at must not be before created_at")]
    InvalidTimeRange,
}

//
// ─── NARRATIVE ─────────────────────────────────────────────────────────────────
//

/// Title and body produced by narrative synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeResult {
    title: String,
    body: String,
}

impl NarrativeResult {
    /// # Errors
    ///
    /// Returns `StoryError` if the title or body is blank.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Result<Self, StoryError> {
        let title = title.into().trim().to_string();
        let body = body.into().trim().to_string();
        if title.is_empty() {
            return Err(StoryError::EmptyTitle);
        }
        if body.is_empty() {
            return Err(StoryError::EmptyNarrative);
        }
        Ok(Self { title, body })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

//
// ─── STORY RECORD ──────────────────────────────────────────────────────────────
//

/// Descriptive extras stored alongside a story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryMetadata {
    pub duration_secs: Option<u32>,
    pub word_count: Option<u32>,
    pub category: Option<PhotoCategory>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub people: Vec<String>,
}

/// A finished narrative as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    id: StoryId,
    title: String,
    narrative: String,
    photo: Option<PhotoContext>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    audio: Option<AudioRef>,
    metadata: StoryMetadata,
}

impl StoryRecord {
    /// Build a new story from a synthesized narrative.
    ///
    /// `word_count` is derived from the narrative body.
    #[must_use]
    pub fn new(
        id: StoryId,
        narrative: NarrativeResult,
        photo: Option<PhotoContext>,
        audio: Option<AudioRef>,
        mut metadata: StoryMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        metadata.word_count = Some(word_count(narrative.body()));
        if metadata.category.is_none() {
            metadata.category = photo.as_ref().and_then(PhotoContext::category);
        }
        let NarrativeResult { title, body } = narrative;
        Self {
            id,
            title,
            narrative: body,
            photo,
            created_at: now,
            updated_at: now,
            audio,
            metadata,
        }
    }

    /// Rebuild a story from storage.
    ///
    /// # Errors
    ///
    /// Returns `StoryError` if text fields are blank or timestamps are inverted.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: StoryId,
        title: String,
        narrative: String,
        photo: Option<PhotoContext>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        audio: Option<AudioRef>,
        metadata: StoryMetadata,
    ) -> Result<Self, StoryError> {
        if updated_at < created_at {
            return Err(StoryError::InvalidTimeRange);
        }
        let NarrativeResult { title, body } = NarrativeResult::new(title, narrative)?;
        Ok(Self {
            id,
            title,
            narrative: body,
            photo,
            created_at,
            updated_at,
            audio,
            metadata,
        })
    }

    /// Change the title, bumping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::EmptyTitle` if the new title is blank.
    pub fn rename(&mut self, title: impl Into<String>, now: DateTime<Utc>) -> Result<(), StoryError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(StoryError::EmptyTitle);
        }
        self.title = title;
        self.updated_at = now.max(self.created_at);
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> StoryId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    #[must_use]
    pub fn photo(&self) -> Option<&PhotoContext> {
        self.photo.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn audio(&self) -> Option<&AudioRef> {
        self.audio.as_ref()
    }

    #[must_use]
    pub fn metadata(&self) -> &StoryMetadata {
        &self.metadata
    }
}

fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}
