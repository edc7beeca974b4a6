//! Scripted collaborators.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use slidegen::collaborator::pptx::PptxRenderer;
use slidegen::{
    AudioExtractor, CollaboratorError, ContentStructurer, PresentationRenderer, Slide,
    SlideContent, Theme, Transcriber,
};

pub fn sample_content() -> SlideContent {
    SlideContent {
        title: "Hello World".to_string(),
        slides: vec![
            Slide {
                title: "Greeting".to_string(),
                content: vec!["Say hello".to_string(), "Wave".to_string()],
            },
            Slide {
                title: "The World".to_string(),
                content: vec!["It is round".to_string()],
            },
        ],
    }
}

/// What each collaborator does when called.
#[derive(Clone)]
pub struct Script {
    pub extract_error: Option<String>,
    pub transcript: Result<String, String>,
    pub slides: Result<SlideContent, String>,
    pub render_error: Option<String>,
    /// Holds extraction until released, to observe a batch in flight.
    pub extract_gate: Option<Gate>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            extract_error: None,
            transcript: Ok("hello world".to_string()),
            slides: Ok(sample_content()),
            render_error: None,
            extract_gate: None,
        }
    }
}

/// Two-way handshake between a test and a collaborator call.
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct CallCounts {
    pub extract: AtomicUsize,
    pub transcribe: AtomicUsize,
    pub structure: AtomicUsize,
    pub render: AtomicUsize,
    /// Theme ids passed to the structurer, in call order.
    pub themes: Mutex<Vec<String>>,
}

impl CallCounts {
    pub fn extract(&self) -> usize {
        self.extract.load(Ordering::SeqCst)
    }

    pub fn transcribe(&self) -> usize {
        self.transcribe.load(Ordering::SeqCst)
    }

    pub fn structure(&self) -> usize {
        self.structure.load(Ordering::SeqCst)
    }

    pub fn render(&self) -> usize {
        self.render.load(Ordering::SeqCst)
    }

    pub fn themes(&self) -> Vec<String> {
        self.themes.lock().unwrap().clone()
    }
}

pub struct FakeExtractor {
    pub script: Script,
    pub calls: Arc<CallCounts>,
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn extract_audio(&self, video: &Path, audio_out: &Path) -> Result<(), CollaboratorError> {
        self.calls.extract.fetch_add(1, Ordering::SeqCst);
        assert!(video.exists(), "upload should be on disk before extraction");

        if let Some(gate) = &self.script.extract_gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if let Some(stderr) = &self.script.extract_error {
            return Err(CollaboratorError::ProcessFailed {
                program: "ffmpeg".to_string(),
                code: Some(1),
                stderr: stderr.clone(),
            });
        }

        tokio::fs::write(audio_out, b"RIFF\x24\x00\x00\x00WAVEfmt ")
            .await
            .map_err(|e| CollaboratorError::Io {
                context: "fake wav".to_string(),
                source: e,
            })
    }
}

pub struct FakeTranscriber {
    pub script: Script,
    pub calls: Arc<CallCounts>,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, CollaboratorError> {
        self.calls.transcribe.fetch_add(1, Ordering::SeqCst);
        assert!(audio.exists(), "audio should be extracted before transcription");

        self.script
            .transcript
            .clone()
            .map_err(|body| CollaboratorError::Api { status: 500, body })
    }
}

pub struct FakeStructurer {
    pub script: Script,
    pub calls: Arc<CallCounts>,
}

#[async_trait]
impl ContentStructurer for FakeStructurer {
    async fn structure(
        &self,
        transcript: &str,
        theme: &Theme,
    ) -> Result<SlideContent, CollaboratorError> {
        self.calls.structure.fetch_add(1, Ordering::SeqCst);
        self.calls.themes.lock().unwrap().push(theme.id.clone());
        assert!(!transcript.is_empty());

        self.script
            .slides
            .clone()
            .map_err(CollaboratorError::InvalidResponse)
    }
}

/// Real pptx writer unless the script says to fail.
pub struct FakeRenderer {
    pub script: Script,
    pub calls: Arc<CallCounts>,
}

#[async_trait]
impl PresentationRenderer for FakeRenderer {
    async fn render(
        &self,
        content: &SlideContent,
        theme: &Theme,
    ) -> Result<Vec<u8>, CollaboratorError> {
        self.calls.render.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.script.render_error {
            return Err(CollaboratorError::InvalidResponse(reason.clone()));
        }
        PptxRenderer::new().render(content, theme).await
    }
}
