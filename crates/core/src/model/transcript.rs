use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TranscriptError {
    #[error("a turn for question {0} is already recorded")]
    DuplicateTurn(QuestionId),
}

//
// ─── AUDIO REFERENCE ──────────────────────────────────────────────────────────
//

/// Opaque locator for a captured recording (file path or URI).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioRef(String);

impl AudioRef {
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AudioRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioRef({})", self.0)
    }
}

impl fmt::Display for AudioRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── TURN RECORD ──────────────────────────────────────────────────────────────
//

/// Placeholder answer stored when a recording could not be transcribed.
///
/// `number` is the 1-based position of the question in the session.
#[must_use]
pub fn fallback_answer(number: usize) -> String {
    format!("Response {number} recorded")
}

/// One completed question/answer cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    question_id: QuestionId,
    question: String,
    answer: String,
    transcribed: bool,
    audio: AudioRef,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl TurnRecord {
    /// A turn whose recording was transcribed.
    #[must_use]
    pub fn transcribed(
        question_id: QuestionId,
        question: impl Into<String>,
        answer: impl Into<String>,
        audio: AudioRef,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            question: question.into(),
            answer: answer.into().trim().to_string(),
            transcribed: true,
            audio,
            started_at,
            completed_at,
        }
    }

    /// A turn whose transcription failed; the answer is the numbered placeholder.
    #[must_use]
    pub fn untranscribed(
        number: usize,
        question_id: QuestionId,
        question: impl Into<String>,
        audio: AudioRef,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            question: question.into(),
            answer: fallback_answer(number),
            transcribed: false,
            audio,
            started_at,
            completed_at,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// False when `answer` is the fallback placeholder.
    #[must_use]
    pub fn is_transcribed(&self) -> bool {
        self.transcribed
    }

    #[must_use]
    pub fn audio(&self) -> &AudioRef {
        &self.audio
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Wall time between capture start and the turn being recorded.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        (self.completed_at - self.started_at).max(chrono::Duration::zero())
    }
}

//
// ─── TRANSCRIPT ───────────────────────────────────────────────────────────────
//

/// Question/answer text handed to narrative synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub question: String,
    pub answer: String,
}

/// Append-only, question-ordered list of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<TurnRecord>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed turn.
    ///
    /// # Errors
    ///
    /// Returns `TranscriptError::DuplicateTurn` if the question already has a turn.
    pub fn append(&mut self, turn: TurnRecord) -> Result<&TurnRecord, TranscriptError> {
        if self.contains(turn.question_id()) {
            return Err(TranscriptError::DuplicateTurn(turn.question_id().clone()));
        }
        self.turns.push(turn);
        Ok(&self.turns[self.turns.len() - 1])
    }

    #[must_use]
    pub fn contains(&self, question_id: &QuestionId) -> bool {
        self.turns.iter().any(|t| t.question_id() == question_id)
    }

    #[must_use]
    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Ordered (question, answer) pairs, fallback answers included.
    #[must_use]
    pub fn prompt_pairs(&self) -> Vec<PromptPair> {
        self.turns
            .iter()
            .map(|t| PromptPair {
                question: t.question().to_string(),
                answer: t.answer().to_string(),
            })
            .collect()
    }

    /// Sum of turn durations, used for story metadata.
    #[must_use]
    pub fn total_duration(&self) -> chrono::Duration {
        self.turns
            .iter()
            .fold(chrono::Duration::zero(), |acc, t| acc + t.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn turn(id: &str, answer: &str) -> TurnRecord {
        TurnRecord::transcribed(
            QuestionId::new(id),
            format!("Question {id}?"),
            answer,
            AudioRef::new(format!("file:///tmp/{id}.m4a")),
            fixed_now(),
            fixed_now() + chrono::Duration::seconds(12),
        )
    }

    #[test]
    fn append_keeps_question_order() {
        let mut transcript = Transcript::new();
        transcript.append(turn("q1", "I felt joy")).unwrap();
        transcript.append(turn("q3", "My mother was there")).unwrap();

        let pairs = transcript.prompt_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question, "Question q1?");
        assert_eq!(pairs[0].answer, "I felt joy");
        assert_eq!(pairs[1].answer, "My mother was there");
    }

    #[test]
    fn duplicate_question_is_rejected_and_transcript_unchanged() {
        let mut transcript = Transcript::new();
        transcript.append(turn("q1", "first")).unwrap();
        let err = transcript.append(turn("q1", "second")).unwrap_err();

        assert_eq!(err, TranscriptError::DuplicateTurn(QuestionId::new("q1")));
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0].answer(), "first");
    }

    #[test]
    fn untranscribed_turn_uses_numbered_placeholder() {
        let t = TurnRecord::untranscribed(
            1,
            QuestionId::new("q2"),
            "Who was most important to you at this time?",
            AudioRef::new("file:///tmp/q2.m4a"),
            fixed_now(),
            fixed_now(),
        );
        assert_eq!(t.answer(), "Response 1 recorded");
        assert!(!t.is_transcribed());
    }

    #[test]
    fn total_duration_sums_turns() {
        let mut transcript = Transcript::new();
        transcript.append(turn("q1", "a")).unwrap();
        transcript.append(turn("q2", "b")).unwrap();
        assert_eq!(transcript.total_duration().num_seconds(), 24);
    }
}
