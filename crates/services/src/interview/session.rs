use chrono::{DateTime, Utc};

use memoir_core::model::{
    PhotoContext, Question, SessionId, SessionStatus, Transcript, TranscriptError, TurnRecord,
    VoiceState,
};

use super::plan::QuestionSequence;

/// One interview in progress. Mutated only by `InterviewController`; callers
/// see clones via `InterviewController::snapshot`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewSession {
    id: SessionId,
    photo: Option<PhotoContext>,
    sequence: QuestionSequence,
    voice: VoiceState,
    transcript: Transcript,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl InterviewSession {
    pub(crate) fn new(
        id: SessionId,
        photo: Option<PhotoContext>,
        sequence: QuestionSequence,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            photo,
            sequence,
            voice: VoiceState::Idle,
            transcript: Transcript::new(),
            status: SessionStatus::InProgress,
            started_at,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn photo(&self) -> Option<&PhotoContext> {
        self.photo.as_ref()
    }

    #[must_use]
    pub fn sequence(&self) -> &QuestionSequence {
        &self.sequence
    }

    /// Index of the question being asked. Equal to the number of recorded turns.
    #[must_use]
    pub fn position(&self) -> usize {
        self.transcript.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.sequence.len()
    }

    /// The question awaiting an answer, or `None` once every question has a turn.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.sequence.get(self.position())
    }

    #[must_use]
    pub fn voice(&self) -> VoiceState {
        self.voice
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub(crate) fn set_voice(&mut self, voice: VoiceState) {
        self.voice = voice;
    }

    /// Append a finished turn and advance; marks the session complete after
    /// the last question.
    pub(crate) fn record(
        &mut self,
        turn: TurnRecord,
        now: DateTime<Utc>,
    ) -> Result<(), TranscriptError> {
        self.transcript.append(turn)?;
        if self.position() >= self.sequence.len() {
            self.status = SessionStatus::Complete;
            self.completed_at = Some(now);
            self.voice = VoiceState::Idle;
        }
        Ok(())
    }

    pub(crate) fn mark_abandoned(&mut self) {
        self.status = SessionStatus::Abandoned;
        self.voice = VoiceState::Idle;
    }
}
