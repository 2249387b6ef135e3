#![forbid(unsafe_code)]

pub mod app_services;
pub mod capabilities;
pub mod error;
pub mod interview;
pub mod narrative;
pub mod openai;
pub mod settings_service;
pub mod story_service;

pub use memoir_core::Clock;

pub use app_services::AppServices;
pub use capabilities::{
    AudioCapture, InterviewCapabilities, NarrativeGenerator, RecordingHandle, SpeechPlayback,
    Transcriber,
};
pub use error::{
    AppServicesError, CaptureError, GenerationError, InterviewError, OpenAiError, SettingsServiceError,
    SpeechError, StoryServiceError, SynthesisError, TranscriptionError,
};
pub use interview::{
    FinishOutcome, InterviewController, InterviewEvent, InterviewSession, QuestionSequence,
    SequencePlanner, StopOutcome,
};
pub use narrative::{NarrativeRequest, NarrativeSynthesizer};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use settings_service::SettingsService;
pub use story_service::StoryService;
