use thiserror::Error;

use crate::model::{PhotoError, QuestionError, SettingsError, StoryError, TranscriptError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
    #[error(transparent)]
    Story(#[from] StoryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
