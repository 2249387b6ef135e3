//! Device and provider seams the interview engine talks through.
//!
//! Every capability is an object-safe async trait so the controller can hold
//! `Arc<dyn _>` handles constructed once by the host application.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use memoir_core::model::{AudioRef, VoiceSpeed};

use crate::error::{CaptureError, GenerationError, SpeechError, TranscriptionError};
use crate::narrative::NarrativeRequest;

/// An in-progress recording, owned by exactly one turn.
///
/// Not `Clone`: the handle is consumed by `stop_recording` or
/// `discard_recording`.
pub struct RecordingHandle {
    id: String,
}

impl RecordingHandle {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for RecordingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordingHandle").field(&self.id).finish()
    }
}

/// Text-to-speech output for interview prompts.
#[async_trait]
pub trait SpeechPlayback: Send + Sync {
    /// Speak `text`, resolving once playback has finished.
    async fn speak(&self, text: &str, speed: VoiceSpeed) -> Result<(), SpeechError>;

    /// Stop any playback in progress. Idempotent.
    async fn stop(&self);
}

/// Microphone capture.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    async fn start_recording(&self) -> Result<RecordingHandle, CaptureError>;

    async fn stop_recording(&self, handle: RecordingHandle) -> Result<AudioRef, CaptureError>;

    /// Throw a recording away without producing audio.
    async fn discard_recording(&self, handle: RecordingHandle);
}

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioRef) -> Result<String, TranscriptionError>;
}

/// Text generation for the finished narrative.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, GenerationError>;
}

/// The set of capabilities one `InterviewController` drives.
#[derive(Clone)]
pub struct InterviewCapabilities {
    pub playback: Arc<dyn SpeechPlayback>,
    pub capture: Arc<dyn AudioCapture>,
    pub transcriber: Arc<dyn Transcriber>,
    pub generator: Arc<dyn NarrativeGenerator>,
}
