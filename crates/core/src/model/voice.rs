use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the current turn.
///
/// Exactly one value is live per session and it gates which operations are
/// legal: capture may only start from `Idle`, and only a `Listening` turn can
/// be stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceState {
    #[default]
    Idle,
    /// Capture is running for the current question.
    Listening,
    /// Capture stopped; transcription and the next prompt are in flight.
    Processing,
}

impl VoiceState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Processing => "processing",
        }
    }
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    InProgress,
    /// Every question has a recorded turn.
    Complete,
    Abandoned,
}

impl SessionStatus {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::InProgress)
    }
}
