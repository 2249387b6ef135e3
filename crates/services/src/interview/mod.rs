mod controller;
mod plan;
mod session;

// Public API of the interview subsystem.
pub use crate::error::InterviewError;
pub use controller::{FinishOutcome, InterviewController, InterviewEvent, StopOutcome};
pub use plan::{QuestionSequence, SequencePlanner};
pub use session::InterviewSession;
