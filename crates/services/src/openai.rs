use std::env;
use std::path::Path;

use async_trait::async_trait;
use memoir_core::model::AudioRef;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::capabilities::{NarrativeGenerator, Transcriber};
use crate::error::{GenerationError, OpenAiError, TranscriptionError};
use crate::narrative::NarrativeRequest;

const NARRATIVE_TEMPERATURE: f32 = 0.8;
const NARRATIVE_MAX_TOKENS: u32 = 1000;

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub transcription_model: String,
    pub language: String,
}

impl OpenAiConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("MEMOIR_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("MEMOIR_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("MEMOIR_AI_MODEL").unwrap_or_else(|_| "gpt-4".into());
        let transcription_model =
            env::var("MEMOIR_STT_MODEL").unwrap_or_else(|_| "whisper-1".into());
        let language = env::var("MEMOIR_STT_LANGUAGE").unwrap_or_else(|_| "en".into());
        Some(Self {
            base_url,
            api_key,
            model,
            transcription_model,
            language,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// Chat-completions narrative provider and audio transcription provider.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: Option<OpenAiConfig>,
}

impl OpenAiClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(OpenAiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<OpenAiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send a narrative request and return the raw reply text.
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError` when the client is disabled, the request fails,
    /// or the response is empty.
    pub async fn complete(&self, request: &NarrativeRequest) -> Result<String, OpenAiError> {
        let config = self.config.as_ref().ok_or(OpenAiError::Disabled)?;

        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system().to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt().to_string(),
                },
            ],
            temperature: NARRATIVE_TEMPERATURE,
            max_tokens: NARRATIVE_MAX_TOKENS,
        };

        let response = self
            .client
            .post(config.endpoint("chat/completions"))
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OpenAiError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(OpenAiError::EmptyResponse)
    }

    /// Upload the recording behind `audio` and return its transcription.
    ///
    /// `audio` is a local path, optionally prefixed with `file://`.
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError` when the client is disabled, the file cannot be
    /// read, the request fails, or no text comes back.
    pub async fn transcribe_file(&self, audio: &AudioRef) -> Result<String, OpenAiError> {
        let config = self.config.as_ref().ok_or(OpenAiError::Disabled)?;

        let path = local_path(audio);
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("recording.m4a")
            .to_string();

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("model", config.transcription_model.clone())
            .text("language", config.language.clone());

        let response = self
            .client
            .post(config.endpoint("audio/transcriptions"))
            .bearer_auth(&config.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OpenAiError::HttpStatus(response.status()));
        }

        let body: TranscriptionResponse = response.json().await?;
        let text = body.text.trim();
        if text.is_empty() {
            return Err(OpenAiError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

fn local_path(audio: &AudioRef) -> &Path {
    let raw = audio.as_str();
    Path::new(raw.strip_prefix("file://").unwrap_or(raw))
}

#[async_trait]
impl NarrativeGenerator for OpenAiClient {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, GenerationError> {
        Ok(self.complete(request).await?)
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio: &AudioRef) -> Result<String, TranscriptionError> {
        Ok(self.transcribe_file(audio).await?)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}
