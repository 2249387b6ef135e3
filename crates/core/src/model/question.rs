use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),

    #[error("unknown question category: {0}")]
    UnknownCategory(String),
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Theme a question explores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    People,
    Feelings,
    Events,
    Significance,
    Legacy,
    Details,
}

impl QuestionCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Feelings => "feelings",
            Self::Events => "events",
            Self::Significance => "significance",
            Self::Legacy => "legacy",
            Self::Details => "details",
        }
    }

    /// Categories whose answers tend to add little to the final narrative.
    ///
    /// The sequencer only includes these questions some of the time.
    #[must_use]
    pub fn is_low_yield(self) -> bool {
        matches!(self, Self::Details)
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionCategory {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "people" => Ok(Self::People),
            "feelings" => Ok(Self::Feelings),
            "events" => Ok(Self::Events),
            "significance" => Ok(Self::Significance),
            "legacy" => Ok(Self::Legacy),
            "details" => Ok(Self::Details),
            other => Err(QuestionError::UnknownCategory(other.to_string())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single interview prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    category: QuestionCategory,
    follow_ups: Vec<String>,
}

impl Question {
    /// Creates a question without follow-up prompts.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the prompt text is blank.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        category: QuestionCategory,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        Ok(Self {
            id,
            text,
            category,
            follow_ups: Vec::new(),
        })
    }

    /// Attach follow-up prompts; blank entries are dropped.
    #[must_use]
    pub fn with_follow_ups<I, S>(mut self, follow_ups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.follow_ups = follow_ups
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn category(&self) -> QuestionCategory {
        self.category
    }

    #[must_use]
    pub fn follow_ups(&self) -> &[String] {
        &self.follow_ups
    }
}

//
// ─── POOL ──────────────────────────────────────────────────────────────────────
//

/// Static, ordered collection of questions a session draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPool {
    questions: Vec<Question>,
}

impl QuestionPool {
    /// Build a pool from explicit questions, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id().clone()) {
                return Err(QuestionError::DuplicateId(question.id().clone()));
            }
        }
        Ok(Self { questions })
    }

    /// The stock interview questions, two per category.
    #[must_use]
    pub fn standard() -> Self {
        let q = |id: &str, text: &str, category| Question {
            id: QuestionId::new(id),
            text: text.to_string(),
            category,
            follow_ups: Vec::new(),
        };

        let questions = vec![
            q("q1", "Who were you with in this moment?", QuestionCategory::People)
                .with_follow_ups(["What were they like?", "What did they mean to you?"]),
            q(
                "q2",
                "Who was most important to you at this time?",
                QuestionCategory::People,
            ),
            q(
                "q3",
                "What were you feeling on this day?",
                QuestionCategory::Feelings,
            )
            .with_follow_ups([
                "Why did you feel that way?",
                "Do you remember what made you feel that?",
            ]),
            q(
                "q4",
                "What emotions come back when you see this photo?",
                QuestionCategory::Feelings,
            ),
            q(
                "q5",
                "What was happening in this moment?",
                QuestionCategory::Events,
            )
            .with_follow_ups(["How did it all begin?", "What happened next?"]),
            q(
                "q6",
                "Can you tell me about the day this photo was taken?",
                QuestionCategory::Events,
            ),
            q(
                "q7",
                "Why was this moment important to you?",
                QuestionCategory::Significance,
            ),
            q(
                "q8",
                "What made this time in your life special?",
                QuestionCategory::Significance,
            ),
            q(
                "q9",
                "What would you tell your grandchildren about this time in your life?",
                QuestionCategory::Legacy,
            ),
            q(
                "q10",
                "What do you want your family to remember about this moment?",
                QuestionCategory::Legacy,
            ),
            q(
                "q11",
                "What do you remember most vividly about this day?",
                QuestionCategory::Details,
            )
            .with_follow_ups([
                "Were there any sounds or smells you remember?",
                "What were you wearing?",
            ]),
            q(
                "q12",
                "Where were you when this photo was taken?",
                QuestionCategory::Details,
            ),
        ];

        Self { questions }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pool_covers_every_category_twice() {
        let pool = QuestionPool::standard();
        assert_eq!(pool.len(), 12);
        for category in [
            QuestionCategory::People,
            QuestionCategory::Feelings,
            QuestionCategory::Events,
            QuestionCategory::Significance,
            QuestionCategory::Legacy,
            QuestionCategory::Details,
        ] {
            let count = pool
                .questions()
                .iter()
                .filter(|q| q.category() == category)
                .count();
            assert_eq!(count, 2, "category {category}");
        }
    }

    #[test]
    fn pool_rejects_duplicate_ids() {
        let a = Question::new(QuestionId::new("a"), "One?", QuestionCategory::People).unwrap();
        let b = Question::new(QuestionId::new("a"), "Two?", QuestionCategory::Legacy).unwrap();
        let err = QuestionPool::new(vec![a, b]).unwrap_err();
        assert_eq!(err, QuestionError::DuplicateId(QuestionId::new("a")));
    }

    #[test]
    fn blank_question_text_is_rejected() {
        let err = Question::new(QuestionId::new("x"), "   ", QuestionCategory::Events).unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn only_details_is_low_yield() {
        assert!(QuestionCategory::Details.is_low_yield());
        assert!(!QuestionCategory::Feelings.is_low_yield());
        assert_eq!(
            "significance".parse::<QuestionCategory>().unwrap(),
            QuestionCategory::Significance
        );
    }
}
