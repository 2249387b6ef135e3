//! Shared error types for the services crate.

use thiserror::Error;

use memoir_core::model::{SettingsError, StoryError, TranscriptError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

//
// ─── CAPABILITY ERRORS ─────────────────────────────────────────────────────────
//

/// Failures reported by an `AudioCapture` device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no recording in progress")]
    NotRecording,
    #[error("capture device error: {0}")]
    Device(String),
}

/// Failures reported by a `Transcriber`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TranscriptionError {
    #[error("transcription returned no text")]
    Empty,
    #[error("transcription provider failed: {0}")]
    Provider(String),
}

/// Failures reported by a `NarrativeGenerator`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("narrative provider is not configured")]
    Unavailable,
    #[error("narrative provider failed: {0}")]
    Provider(String),
}

/// Failures reported by a `SpeechPlayback` device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpeechError {
    #[error("speech playback failed: {0}")]
    Playback(String),
}

/// Why a narrative could not be produced from a transcript.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SynthesisError {
    #[error(transparent)]
    Provider(#[from] GenerationError),
    #[error("narrative reply was empty")]
    EmptyReply,
    #[error("narrative reply had no title")]
    MissingTitle,
    #[error("narrative reply had no body")]
    MissingBody,
}

//
// ─── SERVICE ERRORS ────────────────────────────────────────────────────────────
//

/// Errors emitted by `InterviewController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterviewError {
    #[error("audio capture unavailable: {0}")]
    CaptureUnavailable(#[source] CaptureError),
    #[error("narrative synthesis failed: {0}")]
    SynthesisFailed(#[from] SynthesisError),
    #[error(transparent)]
    DuplicateTurn(#[from] TranscriptError),
    #[error("voice channel is busy")]
    VoiceBusy,
    #[error("no interview in progress")]
    NoActiveSession,
    #[error("an interview is already in progress")]
    SessionActive,
    #[error("interview already completed")]
    Completed,
    #[error("interview was cancelled")]
    Cancelled,
    #[error("no questions available for interview")]
    EmptySequence,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `OpenAiClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpenAiError {
    #[error("openai provider is not configured")]
    Disabled,
    #[error("openai provider returned an empty response")]
    EmptyResponse,
    #[error("openai request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("failed to read audio: {0}")]
    Audio(#[from] std::io::Error),
}

impl From<OpenAiError> for GenerationError {
    fn from(err: OpenAiError) -> Self {
        match err {
            OpenAiError::Disabled => GenerationError::Unavailable,
            other => GenerationError::Provider(other.to_string()),
        }
    }
}

impl From<OpenAiError> for TranscriptionError {
    fn from(err: OpenAiError) -> Self {
        match err {
            OpenAiError::EmptyResponse => TranscriptionError::Empty,
            other => TranscriptionError::Provider(other.to_string()),
        }
    }
}

/// Errors emitted by `StoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoryServiceError {
    #[error(transparent)]
    Story(#[from] StoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Settings(#[from] SettingsServiceError),
}
