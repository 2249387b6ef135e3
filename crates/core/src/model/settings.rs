use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_QUESTION_COUNT: u32 = 5;
pub const MAX_QUESTION_COUNT: u32 = 12;
pub const DEFAULT_TURN_TIMEOUT_SECS: u32 = 30;
pub const DEFAULT_OPTIONAL_INCLUSION: f64 = 0.5;
pub const DEFAULT_PHOTO_DESCRIPTION: &str = "A meaningful photo";

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be between 1 and {MAX_QUESTION_COUNT}")]
    InvalidQuestionCount,

    #[error("turn timeout must be between 5 and 600 seconds")]
    InvalidTurnTimeout,

    #[error("optional inclusion probability must be in [0, 1], got {0}")]
    InvalidOptionalInclusion(f64),

    #[error("unknown voice speed: {0}")]
    UnknownVoiceSpeed(String),
}

/// Playback rate for spoken prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl VoiceSpeed {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Normal => "normal",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for VoiceSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceSpeed {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slow" => Ok(Self::Slow),
            "normal" => Ok(Self::Normal),
            "fast" => Ok(Self::Fast),
            other => Err(SettingsError::UnknownVoiceSpeed(other.to_string())),
        }
    }
}

/// Every recognized interview option, validated.
#[derive(Clone, Debug, PartialEq)]
pub struct InterviewSettings {
    question_count: u32,
    turn_timeout_secs: u32,
    optional_inclusion: f64,
    auto_play: bool,
    voice_speed: VoiceSpeed,
    selection_seed: Option<u64>,
    fallback_photo_description: String,
}

/// Unvalidated settings; `None` fields fall back to defaults.
#[derive(Clone, Debug, Default)]
pub struct InterviewSettingsDraft {
    pub question_count: Option<u32>,
    pub turn_timeout_secs: Option<u32>,
    pub optional_inclusion: Option<f64>,
    pub auto_play: Option<bool>,
    pub voice_speed: Option<VoiceSpeed>,
    pub selection_seed: Option<u64>,
    pub fallback_photo_description: Option<String>,
}

impl InterviewSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` when a numeric option is out of range.
    pub fn validate(self) -> Result<InterviewSettings, SettingsError> {
        let question_count = self.question_count.unwrap_or(DEFAULT_QUESTION_COUNT);
        if !(1..=MAX_QUESTION_COUNT).contains(&question_count) {
            return Err(SettingsError::InvalidQuestionCount);
        }

        let turn_timeout_secs = self.turn_timeout_secs.unwrap_or(DEFAULT_TURN_TIMEOUT_SECS);
        if !(5..=600).contains(&turn_timeout_secs) {
            return Err(SettingsError::InvalidTurnTimeout);
        }

        let optional_inclusion = self
            .optional_inclusion
            .unwrap_or(DEFAULT_OPTIONAL_INCLUSION);
        if !(0.0..=1.0).contains(&optional_inclusion) {
            return Err(SettingsError::InvalidOptionalInclusion(optional_inclusion));
        }

        let fallback_photo_description = self
            .fallback_photo_description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_PHOTO_DESCRIPTION.to_string());

        Ok(InterviewSettings {
            question_count,
            turn_timeout_secs,
            optional_inclusion,
            auto_play: self.auto_play.unwrap_or(true),
            voice_speed: self.voice_speed.unwrap_or_default(),
            selection_seed: self.selection_seed,
            fallback_photo_description,
        })
    }
}

impl InterviewSettings {
    /// Number of questions asked per session.
    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn turn_timeout_secs(&self) -> u32 {
        self.turn_timeout_secs
    }

    /// Ceiling on a single recording, measured from entering `Listening`.
    #[must_use]
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.turn_timeout_secs))
    }

    /// Probability a low-yield question is kept during selection.
    #[must_use]
    pub fn optional_inclusion(&self) -> f64 {
        self.optional_inclusion
    }

    /// Speak prompts automatically when a question becomes current.
    #[must_use]
    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    #[must_use]
    pub fn voice_speed(&self) -> VoiceSpeed {
        self.voice_speed
    }

    /// Fixed seed for question selection; `None` selects non-deterministically.
    #[must_use]
    pub fn selection_seed(&self) -> Option<u64> {
        self.selection_seed
    }

    #[must_use]
    pub fn fallback_photo_description(&self) -> &str {
        &self.fallback_photo_description
    }

    /// Convert back into a draft, e.g. to edit one option and re-validate.
    #[must_use]
    pub fn to_draft(&self) -> InterviewSettingsDraft {
        InterviewSettingsDraft {
            question_count: Some(self.question_count),
            turn_timeout_secs: Some(self.turn_timeout_secs),
            optional_inclusion: Some(self.optional_inclusion),
            auto_play: Some(self.auto_play),
            voice_speed: Some(self.voice_speed),
            selection_seed: self.selection_seed,
            fallback_photo_description: Some(self.fallback_photo_description.clone()),
        }
    }
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            turn_timeout_secs: DEFAULT_TURN_TIMEOUT_SECS,
            optional_inclusion: DEFAULT_OPTIONAL_INCLUSION,
            auto_play: true,
            voice_speed: VoiceSpeed::Normal,
            selection_seed: None,
            fallback_photo_description: DEFAULT_PHOTO_DESCRIPTION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_validates_to_defaults() {
        let settings = InterviewSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, InterviewSettings::default());
        assert_eq!(settings.turn_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = InterviewSettingsDraft {
            question_count: Some(0),
            ..InterviewSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, SettingsError::InvalidQuestionCount);

        let err = InterviewSettingsDraft {
            turn_timeout_secs: Some(1),
            ..InterviewSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, SettingsError::InvalidTurnTimeout);

        let err = InterviewSettingsDraft {
            optional_inclusion: Some(1.5),
            ..InterviewSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, SettingsError::InvalidOptionalInclusion(1.5));
    }

    #[test]
    fn blank_fallback_description_uses_default() {
        let settings = InterviewSettingsDraft {
            fallback_photo_description: Some("  ".into()),
            ..InterviewSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.fallback_photo_description(), "A meaningful photo");
    }

    #[test]
    fn draft_round_trip_preserves_values() {
        let settings = InterviewSettingsDraft {
            question_count: Some(3),
            selection_seed: Some(7),
            voice_speed: Some(VoiceSpeed::Slow),
            ..InterviewSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.to_draft().validate().unwrap(), settings);
    }
}
