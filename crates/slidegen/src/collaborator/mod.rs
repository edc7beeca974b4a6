//! External work the pipeline delegates: audio extraction, speech-to-text,
//! slide structuring and presentation rendering.
//!
//! Each concern is a trait so the controller can run against the production
//! implementations or scripted fakes in tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::error::ConfigError;
use crate::job::SlideContent;
use crate::theme::Theme;

pub mod ffmpeg;
pub mod openai;
pub mod pptx;

pub use ffmpeg::FfmpegExtractor;
pub use openai::{OpenAiClient, OpenAiStructurer, OpenAiTranscriber};
pub use pptx::PptxRenderer;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {stderr}", exit_label(.code))]
    ProcessFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Failed to write package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "signal".to_string(),
    }
}

impl CollaboratorError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Decodes the audio track of a video into a mono WAV file.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract_audio(&self, video: &Path, audio_out: &Path) -> Result<(), CollaboratorError>;
}

/// Speech-to-text over an extracted audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, CollaboratorError>;
}

/// Turns a transcript into a titled list of slides.
#[async_trait]
pub trait ContentStructurer: Send + Sync {
    async fn structure(
        &self,
        transcript: &str,
        theme: &Theme,
    ) -> Result<SlideContent, CollaboratorError>;
}

/// Produces presentation file bytes.
#[async_trait]
pub trait PresentationRenderer: Send + Sync {
    async fn render(&self, content: &SlideContent, theme: &Theme)
        -> Result<Vec<u8>, CollaboratorError>;
}

/// The four collaborators a pipeline runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub structurer: Arc<dyn ContentStructurer>,
    pub renderer: Arc<dyn PresentationRenderer>,
}

impl Collaborators {
    /// Production collaborators: ffmpeg, the OpenAI-compatible API and the
    /// built-in pptx writer.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let client = OpenAiClient::from_config(&config.openai)?;
        Ok(Self {
            extractor: Arc::new(FfmpegExtractor::from_config(&config.ffmpeg)),
            transcriber: Arc::new(OpenAiTranscriber::new(
                client.clone(),
                &config.openai.transcription_model,
            )),
            structurer: Arc::new(OpenAiStructurer::new(
                client,
                &config.openai.chat_model,
                config.openai.max_tokens,
            )),
            renderer: Arc::new(PptxRenderer::new()),
        })
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
