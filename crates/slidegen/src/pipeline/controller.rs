//! Drives jobs through the stage state machine.
//!
//! Every status change goes through [`JobStore::transition`], so a request
//! that loses a race for a job fails with `InvalidState` instead of running
//! the batch twice. No store lock is held while a collaborator runs.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use super::executor::StageExecutor;
use super::progress::ProgressReporter;
use crate::error::{Result, SlidegenError, StageError};
use crate::job::{Job, JobId, JobStatus, JobStore, SlideContent};
use crate::theme::ThemeRegistry;

const TRANSCRIBE: &str = "transcribe";
const GENERATE_SLIDES: &str = "generate slides for";

pub struct PipelineController {
    store: Arc<JobStore>,
    themes: Arc<ThemeRegistry>,
    executor: StageExecutor,
    progress: Arc<dyn ProgressReporter>,
}

impl PipelineController {
    pub fn new(
        store: Arc<JobStore>,
        themes: Arc<ThemeRegistry>,
        executor: StageExecutor,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            store,
            themes,
            executor,
            progress,
        }
    }

    /// Extracts and transcribes the job's audio, returning the transcript.
    ///
    /// A job that already has a transcript returns it without running any
    /// stage again. A job whose batch is running, or that failed, is
    /// rejected.
    pub async fn request_transcript(&self, id: &JobId) -> Result<String> {
        let job = self.store.get(id)?;
        if let Some(cached) = cached_transcript(&job) {
            return Ok(cached);
        }

        let job = match self.store.transition(
            id,
            TRANSCRIBE,
            &[JobStatus::Uploaded],
            JobStatus::ExtractingAudio,
            |_| {},
        ) {
            Ok(job) => job,
            Err(err @ SlidegenError::InvalidState { .. }) => {
                // Another request may have finished the batch in between.
                return cached_transcript(&self.store.get(id)?).ok_or(err);
            }
            Err(err) => return Err(err),
        };

        let span = info_span!("transcript_batch", job_id = %id);
        self.run_transcript_batch(job).instrument(span).await
    }

    async fn run_transcript_batch(&self, job: Job) -> Result<String> {
        self.progress.report(&job);

        let audio = match self.executor.extract_audio(&job).await {
            Ok(path) => path,
            Err(e) => return Err(self.fail(&job.id, JobStatus::ExtractingAudio, e)),
        };

        let job = self.advance(&job.id, JobStatus::ExtractingAudio, JobStatus::Transcribing, |j| {
            j.audio_path = Some(audio.clone());
        })?;

        let transcript = match self.executor.transcribe(&job, &audio).await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(&job.id, JobStatus::Transcribing, e)),
        };

        self.advance(&job.id, JobStatus::Transcribing, JobStatus::TranscriptReady, |j| {
            j.transcript = Some(transcript.clone());
        })?;

        info!(chars = transcript.len(), "Transcript ready");
        Ok(transcript)
    }

    /// Generates slide content and renders the presentation.
    ///
    /// Only valid at `transcript_ready`. The theme is checked before the job
    /// is touched; `None` selects the registry's default theme.
    pub async fn request_slides(&self, id: &JobId, theme_id: Option<&str>) -> Result<SlideContent> {
        let job = self.store.get(id)?;
        if job.status != JobStatus::TranscriptReady {
            return Err(SlidegenError::InvalidState {
                job_id: id.clone(),
                operation: GENERATE_SLIDES,
                status: job.status,
            });
        }
        let theme_id = self.themes.resolve(theme_id)?.id.clone();

        let job = self.store.transition(
            id,
            GENERATE_SLIDES,
            &[JobStatus::TranscriptReady],
            JobStatus::GeneratingSlides,
            |j| j.theme_id = Some(theme_id.clone()),
        )?;

        let span = info_span!("slides_batch", job_id = %id, theme = %theme_id);
        self.run_slides_batch(job, &theme_id).instrument(span).await
    }

    async fn run_slides_batch(&self, job: Job, theme_id: &str) -> Result<SlideContent> {
        self.progress.report(&job);
        let theme = self.themes.get(theme_id)?;
        let transcript = job.transcript.clone().unwrap_or_default();

        let content = match self.executor.structure(&job, &transcript, theme).await {
            Ok(content) => content,
            Err(e) => return Err(self.fail(&job.id, JobStatus::GeneratingSlides, e)),
        };

        let job = self.advance(
            &job.id,
            JobStatus::GeneratingSlides,
            JobStatus::CreatingPowerpoint,
            |j| j.slide_content = Some(content.clone()),
        )?;

        let output = match self.executor.render(&job, &content, theme).await {
            Ok(path) => path,
            Err(e) => return Err(self.fail(&job.id, JobStatus::CreatingPowerpoint, e)),
        };

        self.advance(&job.id, JobStatus::CreatingPowerpoint, JobStatus::Completed, |j| {
            j.output_path = Some(output.clone());
        })?;

        info!(slides = content.slides.len(), "Presentation completed");
        Ok(content)
    }

    /// Moves a job this batch owns to its next stage and reports it.
    fn advance<F>(&self, id: &JobId, from: JobStatus, to: JobStatus, mutator: F) -> Result<Job>
    where
        F: FnOnce(&mut Job),
    {
        let operation = match from {
            JobStatus::ExtractingAudio | JobStatus::Transcribing => TRANSCRIBE,
            _ => GENERATE_SLIDES,
        };
        let job = self.store.transition(id, operation, &[from], to, mutator)?;
        self.progress.report(&job);
        Ok(job)
    }

    /// Records a stage failure on the job and returns it to the caller.
    fn fail(&self, id: &JobId, stage: JobStatus, error: StageError) -> SlidegenError {
        let detail = error.to_string();
        warn!(job_id = %id, stage = %stage, error = %detail, "Job failed");

        match self
            .store
            .transition(id, "fail", &[stage], JobStatus::Error, |j| {
                j.error_detail = Some(detail);
                j.failed_stage = Some(stage);
            }) {
            Ok(job) => self.progress.report(&job),
            Err(e) => warn!(job_id = %id, error = %e, "Could not record job failure"),
        }

        SlidegenError::Stage(error)
    }
}

fn cached_transcript(job: &Job) -> Option<String> {
    if job.status.has_transcript() {
        job.transcript.clone()
    } else {
        None
    }
}
