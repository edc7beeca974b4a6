//! Public operations of the slide generation service.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::broadcast::{JobProgressBroadcaster, JobProgressEvent};
use crate::collaborator::pptx::PPTX_MIME;
use crate::collaborator::Collaborators;
use crate::config::Config;
use crate::error::{Result, SlidegenError, StorageError};
use crate::job::{Job, JobCounts, JobId, JobStatus, JobStatusView, JobStore, SlideContent};
use crate::media::MediaFormat;
use crate::pipeline::{PipelineController, ProgressReporter, StageExecutor};
use crate::sanitize::redact_path;
use crate::storage::ArtifactStorage;
use crate::theme::{Theme, ThemeRegistry};

/// A rendered presentation ready to hand to a client.
#[derive(Debug, Clone)]
pub struct DownloadedArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub struct SlideService {
    store: Arc<JobStore>,
    themes: Arc<ThemeRegistry>,
    storage: ArtifactStorage,
    controller: PipelineController,
    broadcaster: JobProgressBroadcaster,
    accepted_formats: Vec<MediaFormat>,
}

impl SlideService {
    /// Production constructor: real collaborators built from config.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let collaborators = Collaborators::from_config(config)?;
        Self::with_collaborators(config, collaborators).await
    }

    /// Builds the service around the given collaborators and prepares the
    /// storage layout.
    pub async fn with_collaborators(config: &Config, collaborators: Collaborators) -> Result<Self> {
        let themes = Arc::new(ThemeRegistry::with_default(&config.pipeline.default_theme)?);
        let storage = ArtifactStorage::new(&config.storage.data_dir);
        storage.ensure_layout().await?;

        let store = Arc::new(JobStore::new());
        let broadcaster = JobProgressBroadcaster::default();
        let executor = StageExecutor::new(collaborators, storage.clone());
        let controller = PipelineController::new(
            Arc::clone(&store),
            Arc::clone(&themes),
            executor,
            Arc::new(broadcaster.clone()),
        );

        info!(
            data_dir = %redact_path(storage.root()),
            default_theme = %themes.default_theme_id(),
            "Slide service ready"
        );

        Ok(Self {
            store,
            themes,
            storage,
            controller,
            broadcaster,
            accepted_formats: config.pipeline.accepted_formats.clone(),
        })
    }

    /// Stores an uploaded video and registers a new job for it.
    pub async fn create_job(&self, filename: &str, content: &[u8]) -> Result<JobId> {
        let format = MediaFormat::from_filename(filename, &self.accepted_formats)?;
        if content.is_empty() {
            return Err(SlidegenError::UnsupportedMedia(format!(
                "'{}' is empty",
                filename
            )));
        }

        let id = JobId::new();
        let input_path = self.storage.store_upload(&id, format, content).await?;
        let job = Job::new(id.clone(), filename, format, input_path);
        self.store.create(job.clone())?;
        self.broadcaster.report(&job);

        info!(
            job_id = %id,
            mime = %format.mime_type(),
            bytes = content.len(),
            "Job created"
        );
        Ok(id)
    }

    pub fn status(&self, id: &JobId) -> Result<JobStatusView> {
        Ok(self.store.get(id)?.status_view())
    }

    /// Returns the transcript, running extraction and transcription first
    /// when the job is still `uploaded`.
    pub async fn transcript(&self, id: &JobId) -> Result<String> {
        self.controller.request_transcript(id).await
    }

    pub fn themes(&self) -> &BTreeMap<String, Theme> {
        self.themes.list()
    }

    pub fn default_theme_id(&self) -> &str {
        self.themes.default_theme_id()
    }

    pub async fn generate_slides(&self, id: &JobId, theme_id: Option<&str>) -> Result<SlideContent> {
        self.controller.request_slides(id, theme_id).await
    }

    /// Reads the rendered presentation of a completed job.
    pub async fn download(&self, id: &JobId) -> Result<DownloadedArtifact> {
        let job = self.store.get(id)?;
        if job.status != JobStatus::Completed {
            return Err(SlidegenError::InvalidState {
                job_id: id.clone(),
                operation: "download output of",
                status: job.status,
            });
        }
        let path = job
            .output_path
            .as_ref()
            .ok_or_else(|| SlidegenError::OutputMissing(id.clone()))?;

        let bytes = match self.storage.read(path).await {
            Ok(bytes) => bytes,
            Err(StorageError::FileNotFound(_)) => return Err(SlidegenError::OutputMissing(id.clone())),
            Err(e) => return Err(e.into()),
        };

        Ok(DownloadedArtifact {
            filename: job.download_filename(),
            content_type: PPTX_MIME,
            bytes,
        })
    }

    /// Full snapshot of a job.
    pub fn job(&self, id: &JobId) -> Result<Job> {
        self.store.get(id)
    }

    pub fn counts(&self) -> JobCounts {
        self.store.counts()
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.broadcaster.subscribe()
    }
}
