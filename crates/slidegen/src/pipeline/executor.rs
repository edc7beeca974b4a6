use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::collaborator::{CollaboratorError, Collaborators};
use crate::error::StageError;
use crate::job::{Job, SlideContent};
use crate::sanitize::redact_path;
use crate::storage::ArtifactStorage;
use crate::theme::Theme;

/// Runs one collaborator call per stage and maps its failure into the
/// matching [`StageError`]. Only ever creates new artifacts.
pub struct StageExecutor {
    collaborators: Collaborators,
    storage: ArtifactStorage,
}

impl StageExecutor {
    pub fn new(collaborators: Collaborators, storage: ArtifactStorage) -> Self {
        Self {
            collaborators,
            storage,
        }
    }

    pub async fn extract_audio(&self, job: &Job) -> Result<PathBuf, StageError> {
        let audio_out = self.storage.audio_path(&job.id);
        timed(job, "extract_audio", async {
            self.collaborators
                .extractor
                .extract_audio(&job.input_path, &audio_out)
                .await
                .map_err(|e| StageError::Decode(e.to_string()))?;

            match tokio::fs::metadata(&audio_out).await {
                Ok(meta) if meta.len() > 0 => Ok(()),
                _ => Err(StageError::Decode(format!(
                    "No audio was written to {}",
                    redact_path(&audio_out)
                ))),
            }
        })
        .await?;
        Ok(audio_out)
    }

    pub async fn transcribe(&self, job: &Job, audio: &Path) -> Result<String, StageError> {
        let transcript = timed(job, "transcribe", async {
            self.collaborators
                .transcriber
                .transcribe(audio)
                .await
                .map_err(|e| StageError::Transcription(e.to_string()))
        })
        .await?;

        if transcript.trim().is_empty() {
            return Err(StageError::Transcription(
                "No speech was recognized in the audio".to_string(),
            ));
        }
        debug!(job_id = %job.id, chars = transcript.len(), "Transcript received");
        Ok(transcript)
    }

    pub async fn structure(
        &self,
        job: &Job,
        transcript: &str,
        theme: &Theme,
    ) -> Result<SlideContent, StageError> {
        let content = timed(job, "structure", async {
            self.collaborators
                .structurer
                .structure(transcript, theme)
                .await
                .map_err(|e| StageError::Generation(e.to_string()))
        })
        .await?;

        if content.slides.is_empty() {
            return Err(StageError::Generation("No slides were produced".to_string()));
        }
        debug!(job_id = %job.id, slides = content.slides.len(), "Slide content generated");
        Ok(content)
    }

    /// Renders the deck and persists it as the job's output artifact.
    pub async fn render(
        &self,
        job: &Job,
        content: &SlideContent,
        theme: &Theme,
    ) -> Result<PathBuf, StageError> {
        let output = self.storage.output_path(&job.id);
        timed(job, "render", async {
            let bytes = self
                .collaborators
                .renderer
                .render(content, theme)
                .await
                .map_err(|e: CollaboratorError| StageError::Render(e.to_string()))?;

            if bytes.is_empty() {
                return Err(StageError::Render("Renderer produced no output".to_string()));
            }

            self.storage
                .write_new(&output, &bytes)
                .await
                .map_err(|e| StageError::Render(format!("Failed to save presentation: {}", e)))
        })
        .await?;
        Ok(output)
    }
}

/// Runs `stage` inside a span and logs how long it took.
async fn timed<T, F>(job: &Job, stage: &'static str, fut: F) -> Result<T, StageError>
where
    F: Future<Output = Result<T, StageError>>,
{
    let span = info_span!("stage", stage, job_id = %job.id);
    async {
        let start = Instant::now();
        let result = fut.await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(elapsed_ms, "Stage finished"),
            Err(e) => warn!(elapsed_ms, error = %e, "Stage failed"),
        }
        result
    }
    .instrument(span)
    .await
}
