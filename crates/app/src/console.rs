//! Terminal stand-ins for the speaker, microphone and speech-to-text.
//!
//! Answers are typed instead of spoken: each recording becomes a text file
//! holding what was typed, and transcription reads that file back.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use memoir_core::model::{AudioRef, VoiceSpeed};
use services::{
    AudioCapture, CaptureError, RecordingHandle, SpeechError, SpeechPlayback, TranscriptionError,
    Transcriber,
};
use tracing::debug;

/// Prints prompts instead of speaking them.
pub struct ConsolePlayback;

#[async_trait]
impl SpeechPlayback for ConsolePlayback {
    async fn speak(&self, text: &str, speed: VoiceSpeed) -> Result<(), SpeechError> {
        println!("  » {text}");
        debug!(speed = speed.as_str(), "prompt printed");
        Ok(())
    }

    async fn stop(&self) {}
}

/// Records typed answers into `<dir>/answer-N.txt`.
pub struct TypedCapture {
    dir: PathBuf,
    next: AtomicU64,
    pending: Mutex<Option<String>>,
}

impl TypedCapture {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: AtomicU64::new(0),
            pending: Mutex::new(None),
        }
    }

    /// Stage the answer for the recording in progress.
    pub fn submit(&self, text: impl Into<String>) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.into());
    }

    fn take_pending(&self) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[async_trait]
impl AudioCapture for TypedCapture {
    async fn start_recording(&self) -> Result<RecordingHandle, CaptureError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| CaptureError::Device(err.to_string()))?;
        self.take_pending();
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RecordingHandle::new(format!("answer-{n}")))
    }

    async fn stop_recording(&self, handle: RecordingHandle) -> Result<AudioRef, CaptureError> {
        let text = self.take_pending().unwrap_or_default();
        let path = self.dir.join(format!("{}.txt", handle.id()));
        tokio::fs::write(&path, text)
            .await
            .map_err(|err| CaptureError::Device(err.to_string()))?;
        Ok(AudioRef::new(path.display().to_string()))
    }

    async fn discard_recording(&self, handle: RecordingHandle) {
        self.take_pending();
        debug!(recording = handle.id(), "recording discarded");
    }
}

/// Reads the text file a `TypedCapture` produced.
pub struct TextFileTranscriber;

#[async_trait]
impl Transcriber for TextFileTranscriber {
    async fn transcribe(&self, audio: &AudioRef) -> Result<String, TranscriptionError> {
        let text = tokio::fs::read_to_string(audio.as_str())
            .await
            .map_err(|err| TranscriptionError::Provider(err.to_string()))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(TranscriptionError::Empty);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("memoir-{name}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn typed_answer_round_trips_through_file() {
        let capture = TypedCapture::new(scratch_dir("typed"));
        let handle = capture.start_recording().await.unwrap();
        capture.submit("We danced until midnight.");
        let audio = capture.stop_recording(handle).await.unwrap();

        assert!(audio.as_str().ends_with("answer-1.txt"));
        let text = TextFileTranscriber.transcribe(&audio).await.unwrap();
        assert_eq!(text, "We danced until midnight.");
    }

    #[tokio::test]
    async fn nothing_typed_transcribes_as_empty() {
        let capture = TypedCapture::new(scratch_dir("silent"));
        let handle = capture.start_recording().await.unwrap();
        let audio = capture.stop_recording(handle).await.unwrap();

        assert_eq!(
            TextFileTranscriber.transcribe(&audio).await,
            Err(TranscriptionError::Empty)
        );
    }

    #[tokio::test]
    async fn missing_file_is_provider_error() {
        let result = TextFileTranscriber
            .transcribe(&AudioRef::new("/definitely/not/here.txt"))
            .await;
        assert!(matches!(result, Err(TranscriptionError::Provider(_))));
    }
}
