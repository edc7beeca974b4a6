//! Transcription and slide structuring over an OpenAI-compatible HTTP API.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CollaboratorError, ContentStructurer, Transcriber};
use crate::config::OpenAiConfig;
use crate::error::ConfigError;
use crate::job::{Slide, SlideContent};
use crate::sanitize::{redact_url, truncate_for_log};
use crate::secrets::SecretSource;
use crate::theme::Theme;

/// A Markdown code fence wrapping the entire (trimmed) reply.
static RE_OUTER_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A```[a-zA-Z]*\s*(.*?)\s*```\z").unwrap());

/// Characters of a provider error body kept in error details.
const ERROR_BODY_LIMIT: usize = 500;

/// Shared HTTP client and credentials for the API.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Validation {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Builds a client, resolving the API key from the configured sources.
    ///
    /// A missing key is not an error here: the server can still accept
    /// uploads, and calls fail with `MissingCredentials` when made.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, ConfigError> {
        let source = SecretSource {
            direct: config.api_key.as_deref(),
            file_path: config.api_key_file.as_deref(),
            env_var: Some(config.api_key_env_var.as_str()),
        };
        let api_key = source.resolve_optional()?;
        if api_key.is_none() {
            warn!(
                env_var = %config.api_key_env_var,
                "No OpenAI API key configured; transcription and slide generation will fail"
            );
        }
        debug!(base_url = %redact_url(&config.base_url), "OpenAI client configured");

        Self::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn api_key(&self) -> Result<&str, CollaboratorError> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or_else(|| {
                CollaboratorError::MissingCredentials("OpenAI API key is not set".to_string())
            })
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CollaboratorError> {
        let response = request.bearer_auth(self.api_key()?).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Api {
                status: status.as_u16(),
                body: truncate_for_log(&body, ERROR_BODY_LIMIT),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &redact_url(&self.base_url))
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct OpenAiTranscriber {
    client: OpenAiClient,
    model: String,
}

impl OpenAiTranscriber {
    pub fn new(client: OpenAiClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, CollaboratorError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| CollaboratorError::io("Failed to read extracted audio", e))?;

        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", part);

        let request = self
            .client
            .http
            .post(self.client.endpoint("audio/transcriptions"))
            .multipart(form);
        let response: TranscriptionResponse = self.client.send(request).await?;

        Ok(response.text.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiStructurer {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
}

impl OpenAiStructurer {
    pub fn new(client: OpenAiClient, model: &str, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.to_string(),
            max_tokens,
        }
    }
}

#[async_trait]
impl ContentStructurer for OpenAiStructurer {
    async fn structure(
        &self,
        transcript: &str,
        theme: &Theme,
    ) -> Result<SlideContent, CollaboratorError> {
        let prompt = build_prompt(transcript, theme);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let request = self
            .client
            .http
            .post(self.client.endpoint("chat/completions"))
            .json(&body);
        let response: ChatResponse = self.client.send(request).await?;

        let reply = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                CollaboratorError::InvalidResponse("Model returned no message".to_string())
            })?;

        debug!(reply_chars = reply.len(), "Slide outline received");
        parse_slide_content(&reply)
    }
}

/// Prompt asking for a 5-8 slide outline as JSON.
pub fn build_prompt(transcript: &str, theme: &Theme) -> String {
    format!(
        r#"Convert the following transcript into a well-structured PowerPoint presentation outline.
Create 5-8 slides with clear titles and bullet points.
The deck will use the "{theme_name}" visual theme ({theme_description}); keep the tone consistent with it.
Format as JSON with this structure:
{{
    "title": "Presentation Title",
    "slides": [
        {{
            "title": "Slide Title",
            "content": ["Bullet point 1", "Bullet point 2", "Bullet point 3"]
        }}
    ]
}}

Transcript: {transcript}
"#,
        theme_name = theme.name,
        theme_description = theme.description,
        transcript = transcript,
    )
}

/// Parses a model reply into slides. Tolerates a Markdown code fence and
/// prose around the JSON object; blank bullets are dropped.
pub fn parse_slide_content(reply: &str) -> Result<SlideContent, CollaboratorError> {
    let parsed = decode_reply(reply).map_err(|e| {
        CollaboratorError::InvalidResponse(format!(
            "Failed to parse slide JSON: {}. Reply was: {}",
            e,
            truncate_for_log(reply, ERROR_BODY_LIMIT)
        ))
    })?;

    let title = parsed.title.trim().to_string();
    if title.is_empty() {
        return Err(CollaboratorError::InvalidResponse(
            "Presentation title is empty".to_string(),
        ));
    }

    let slides: Vec<Slide> = parsed
        .slides
        .into_iter()
        .map(|slide| Slide {
            title: slide.title.trim().to_string(),
            content: slide
                .content
                .into_iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect(),
        })
        .filter(|slide| !slide.title.is_empty() || !slide.content.is_empty())
        .collect();

    if slides.is_empty() {
        return Err(CollaboratorError::InvalidResponse(
            "Model returned no slides".to_string(),
        ));
    }

    Ok(SlideContent { title, slides })
}

/// Plain JSON wins; then the body of a fence wrapping the whole reply; then
/// the first balanced `{...}` in the text that deserializes. The reported
/// error is the one from the plain attempt.
fn decode_reply(reply: &str) -> Result<SlideContent, serde_json::Error> {
    let trimmed = reply.trim();
    let plain_err = match serde_json::from_str(trimmed) {
        Ok(content) => return Ok(content),
        Err(e) => e,
    };

    if let Some(body) = RE_OUTER_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        if let Ok(content) = serde_json::from_str(body.as_str()) {
            return Ok(content);
        }
    }

    trimmed
        .match_indices('{')
        .filter_map(|(start, _)| balanced_object(&trimmed[start..]))
        .find_map(|candidate| serde_json::from_str(candidate).ok())
        .ok_or(plain_err)
}

/// Slices the balanced JSON object `text` opens with, skipping braces inside
/// string literals. `None` when the braces never close.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[..i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
