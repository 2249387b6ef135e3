mod ids;
mod photo;
mod question;
mod settings;
mod story;
mod transcript;
mod voice;

pub use ids::{ParseIdError, PhotoId, QuestionId, SessionId, StoryId};
pub use photo::{PhotoCategory, PhotoContext, PhotoError};
pub use question::{Question, QuestionCategory, QuestionError, QuestionPool};
pub use settings::{InterviewSettings, InterviewSettingsDraft, SettingsError, VoiceSpeed};
pub use story::{NarrativeResult, StoryError, StoryMetadata, StoryRecord};
pub use transcript::{
    AudioRef, PromptPair, Transcript, TranscriptError, TurnRecord, fallback_answer,
};
pub use voice::{SessionStatus, VoiceState};
