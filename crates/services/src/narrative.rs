use std::fmt::Write as _;
use std::sync::Arc;

use memoir_core::model::{NarrativeResult, PhotoContext, PromptPair, StoryError};
use tracing::{debug, warn};

use crate::capabilities::NarrativeGenerator;
use crate::error::SynthesisError;

/// Standing instruction sent with every narrative request.
pub const STORYTELLER_INSTRUCTION: &str = "You are a compassionate storyteller helping elderly people preserve their legacy stories. Your task is to take interview responses and weave them into a beautiful, first-person narrative that captures the warmth, emotion, and significance of their memories. Write in a conversational, warm tone as if the person is telling the story themselves.";

const FORMAT_INSTRUCTION: &str = "Based on the photo and interview responses above, write a heartfelt first-person narrative story. Format your response as:\nTitle: [A short, meaningful title]\nNarrative: [The full story in 3-4 paragraphs, written from the person's perspective, capturing emotions, details, and the significance of this memory]";

/// A single generation request: system instruction plus user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeRequest {
    system: String,
    prompt: String,
}

impl NarrativeRequest {
    #[must_use]
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
        }
    }

    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Turns an ordered transcript into a titled first-person narrative.
#[derive(Clone)]
pub struct NarrativeSynthesizer {
    generator: Arc<dyn NarrativeGenerator>,
    fallback_description: String,
}

impl NarrativeSynthesizer {
    #[must_use]
    pub fn new(
        generator: Arc<dyn NarrativeGenerator>,
        fallback_description: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            fallback_description: fallback_description.into(),
        }
    }

    /// Build the request for a photo and its interview answers.
    #[must_use]
    pub fn build_request(
        &self,
        photo: Option<&PhotoContext>,
        pairs: &[PromptPair],
    ) -> NarrativeRequest {
        let description = photo
            .and_then(PhotoContext::description)
            .unwrap_or(&self.fallback_description);

        let mut prompt = format!("Photo: {description}\n\nInterview Responses:\n");
        for (index, pair) in pairs.iter().enumerate() {
            let n = index + 1;
            // Writing into a String cannot fail.
            let _ = write!(prompt, "\nQ{n}: {}\nA{n}: {}\n", pair.question, pair.answer);
        }
        prompt.push_str("\n\n");
        prompt.push_str(FORMAT_INSTRUCTION);

        NarrativeRequest::new(STORYTELLER_INSTRUCTION, prompt)
    }

    /// Generate and parse a narrative.
    ///
    /// # Errors
    ///
    /// Returns `SynthesisError` if the provider fails or its reply has no
    /// usable title or body.
    pub async fn synthesize(
        &self,
        photo: Option<&PhotoContext>,
        pairs: &[PromptPair],
    ) -> Result<NarrativeResult, SynthesisError> {
        let request = self.build_request(photo, pairs);
        debug!(pairs = pairs.len(), "requesting narrative");
        let reply = self.generator.generate(&request).await.map_err(|err| {
            warn!(error = %err, "narrative provider failed");
            SynthesisError::from(err)
        })?;
        parse_reply(&reply)
    }
}

/// Split a provider reply into title and body.
///
/// The first non-empty line is the title (an optional `Title:` label is
/// removed); everything after it is the body (an optional `Narrative:` label
/// is removed). Labels match case-insensitively.
///
/// # Errors
///
/// Returns `SynthesisError` when the reply, title or body is empty.
pub fn parse_reply(reply: &str) -> Result<NarrativeResult, SynthesisError> {
    let mut lines = reply.lines().skip_while(|line| line.trim().is_empty());
    let title_line = lines.next().ok_or(SynthesisError::EmptyReply)?;
    let title = strip_label(title_line.trim(), "Title:").trim();

    let rest = lines.collect::<Vec<_>>().join("\n");
    let body = strip_label(rest.trim(), "Narrative:").trim();

    NarrativeResult::new(title, body).map_err(|err| match err {
        StoryError::EmptyTitle => SynthesisError::MissingTitle,
        _ => SynthesisError::MissingBody,
    })
}

fn strip_label<'a>(text: &'a str, label: &str) -> &'a str {
    match text.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => &text[label.len()..],
        _ => text,
    }
}
