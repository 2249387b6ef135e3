use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use memoir_core::model::{InterviewSettings, PhotoCategory, Question, QuestionPool};

use crate::error::InterviewError;

/// Ordered questions for one interview. Fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSequence {
    questions: Vec<Question>,
}

impl QuestionSequence {
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Picks the questions for an interview from a pool.
///
/// The pool is walked in order. Low-yield questions are kept only with
/// probability `optional_inclusion`; selection stops at `question_count`.
#[derive(Debug, Clone, Copy)]
pub struct SequencePlanner {
    question_count: usize,
    optional_inclusion: f64,
}

impl SequencePlanner {
    #[must_use]
    pub fn new(settings: &InterviewSettings) -> Self {
        Self {
            question_count: usize::try_from(settings.question_count()).unwrap_or(usize::MAX),
            optional_inclusion: settings.optional_inclusion(),
        }
    }

    /// Reproducible RNG when a seed is configured, otherwise a fresh one.
    #[must_use]
    pub fn rng_for(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Build the question sequence.
    ///
    /// `photo_category` is recorded for diagnostics; the stock policy does not
    /// reorder by it.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::EmptySequence` if no question was selected.
    pub fn build<R: Rng + ?Sized>(
        &self,
        pool: &QuestionPool,
        photo_category: Option<PhotoCategory>,
        rng: &mut R,
    ) -> Result<QuestionSequence, InterviewError> {
        let mut questions = Vec::with_capacity(self.question_count.min(pool.len()));
        for question in pool.questions() {
            if questions.len() == self.question_count {
                break;
            }
            if question.category().is_low_yield() && !rng.random_bool(self.optional_inclusion) {
                continue;
            }
            questions.push(question.clone());
        }

        debug!(
            selected = questions.len(),
            pool = pool.len(),
            photo_category = photo_category.map(PhotoCategory::as_str),
            "built question sequence"
        );

        if questions.is_empty() {
            return Err(InterviewError::EmptySequence);
        }
        Ok(QuestionSequence { questions })
    }
}
