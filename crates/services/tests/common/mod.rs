#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use memoir_core::model::{
    AudioRef, InterviewSettingsDraft, QuestionPool, StoryId, StoryRecord, VoiceSpeed,
};
use memoir_core::time::fixed_clock;
use services::{
    AudioCapture, CaptureError, GenerationError, InterviewCapabilities, InterviewController,
    NarrativeGenerator, NarrativeRequest, RecordingHandle, SpeechError, SpeechPlayback,
    TranscriptionError, Transcriber,
};
use storage::repository::{InMemoryRepository, StorageError, StoryRepository};

pub const GOOD_REPLY: &str =
    "Title: A Day to Remember\nNarrative: It was a wonderful day.\n\nEveryone I loved was there.";

//
// ─── CAPTURE ───────────────────────────────────────────────────────────────────
//

#[derive(Default)]
pub struct FakeCapture {
    started: AtomicUsize,
    stopped: AtomicUsize,
    discarded: AtomicUsize,
    start_failures: Mutex<VecDeque<CaptureError>>,
    stop_failures: Mutex<VecDeque<CaptureError>>,
    start_delay: Mutex<Option<Duration>>,
    stop_delay: Mutex<Option<Duration>>,
}

impl FakeCapture {
    pub fn fail_next_start(&self, err: CaptureError) {
        self.start_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_stop(&self, err: CaptureError) {
        self.stop_failures.lock().unwrap().push_back(err);
    }

    /// Make the device take `delay` to open.
    pub fn slow_start(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = Some(delay);
    }

    /// Make the device take `delay` to close.
    pub fn slow_stop(&self, delay: Duration) {
        *self.stop_delay.lock().unwrap() = Some(delay);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn discarded(&self) -> usize {
        self.discarded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioCapture for FakeCapture {
    async fn start_recording(&self) -> Result<RecordingHandle, CaptureError> {
        let delay = *self.start_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.start_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RecordingHandle::new(format!("rec-{n}")))
    }

    async fn stop_recording(&self, handle: RecordingHandle) -> Result<AudioRef, CaptureError> {
        let delay = *self.stop_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.stop_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(AudioRef::new(format!("mem://{}", handle.id())))
    }

    async fn discard_recording(&self, _handle: RecordingHandle) {
        self.discarded.fetch_add(1, Ordering::SeqCst);
    }
}

//
// ─── TRANSCRIBER ───────────────────────────────────────────────────────────────
//

#[derive(Default)]
pub struct FakeTranscriber {
    script: Mutex<VecDeque<Result<String, TranscriptionError>>>,
    calls: AtomicUsize,
    hang: AtomicBool,
}

impl FakeTranscriber {
    pub fn push(&self, result: Result<String, TranscriptionError>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Make every later call wait forever (until cancelled).
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &AudioRef) -> Result<String, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok("an answer".into()))
    }
}

//
// ─── GENERATOR ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
pub struct FakeGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<NarrativeRequest>>,
}

impl FakeGenerator {
    pub fn push(&self, result: Result<String, GenerationError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|r| r.prompt().to_string())
    }
}

#[async_trait]
impl NarrativeGenerator for FakeGenerator {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(GOOD_REPLY.into()))
    }
}

//
// ─── PLAYBACK ──────────────────────────────────────────────────────────────────
//

#[derive(Default)]
pub struct FakePlayback {
    spoken: Mutex<Vec<String>>,
    stops: AtomicUsize,
}

impl FakePlayback {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechPlayback for FakePlayback {
    async fn speak(&self, text: &str, _speed: VoiceSpeed) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

//
// ─── STORIES ───────────────────────────────────────────────────────────────────
//

/// In-memory stories that can be told to fail the next saves.
#[derive(Default)]
pub struct FlakyStories {
    inner: InMemoryRepository,
    failures: AtomicUsize,
    saves: AtomicUsize,
}

impl FlakyStories {
    pub fn fail_next_saves(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoryRepository for FlakyStories {
    async fn save_story(&self, story: &StoryRecord) -> Result<(), StorageError> {
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(StorageError::Connection("disk full".into()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_story(story).await
    }

    async fn get_story(&self, id: StoryId) -> Result<Option<StoryRecord>, StorageError> {
        self.inner.get_story(id).await
    }

    async fn list_stories(&self) -> Result<Vec<StoryRecord>, StorageError> {
        self.inner.list_stories().await
    }

    async fn delete_story(&self, id: StoryId) -> Result<(), StorageError> {
        self.inner.delete_story(id).await
    }
}

//
// ─── HARNESS ───────────────────────────────────────────────────────────────────
//

pub struct Harness {
    pub controller: InterviewController,
    pub capture: Arc<FakeCapture>,
    pub transcriber: Arc<FakeTranscriber>,
    pub generator: Arc<FakeGenerator>,
    pub playback: Arc<FakePlayback>,
    pub stories: Arc<FlakyStories>,
}

/// Controller over fakes asking the first `questions` stock questions.
pub fn harness(questions: u32) -> Harness {
    harness_with(InterviewSettingsDraft {
        question_count: Some(questions),
        ..InterviewSettingsDraft::default()
    })
}

pub fn harness_with(draft: InterviewSettingsDraft) -> Harness {
    let settings = InterviewSettingsDraft {
        optional_inclusion: draft.optional_inclusion.or(Some(0.0)),
        selection_seed: draft.selection_seed.or(Some(7)),
        ..draft
    }
    .validate()
    .unwrap();

    let capture = Arc::new(FakeCapture::default());
    let transcriber = Arc::new(FakeTranscriber::default());
    let generator = Arc::new(FakeGenerator::default());
    let playback = Arc::new(FakePlayback::default());
    let stories = Arc::new(FlakyStories::default());

    let capabilities = InterviewCapabilities {
        playback: playback.clone(),
        capture: capture.clone(),
        transcriber: transcriber.clone(),
        generator: generator.clone(),
    };
    let controller = InterviewController::new(
        fixed_clock(),
        settings,
        QuestionPool::standard(),
        capabilities,
        stories.clone(),
    );

    Harness {
        controller,
        capture,
        transcriber,
        generator,
        playback,
        stories,
    }
}
