use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::MediaFormat;

/// Opaque job identifier. Generated once per upload and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Stage of a job in the pipeline.
///
/// ```text
/// uploaded → extracting_audio → transcribing → transcript_ready
///          → generating_slides → creating_powerpoint → completed
/// ```
///
/// `error` is entered from any in-progress stage and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Uploaded,
    ExtractingAudio,
    Transcribing,
    TranscriptReady,
    GeneratingSlides,
    CreatingPowerpoint,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::ExtractingAudio => "extracting_audio",
            JobStatus::Transcribing => "transcribing",
            JobStatus::TranscriptReady => "transcript_ready",
            JobStatus::GeneratingSlides => "generating_slides",
            JobStatus::CreatingPowerpoint => "creating_powerpoint",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Human-readable description of what the pipeline is doing.
    pub fn describe(&self) -> &'static str {
        match self {
            JobStatus::Uploaded => "Video uploaded",
            JobStatus::ExtractingAudio => "Extracting audio from video",
            JobStatus::Transcribing => "Transcribing audio",
            JobStatus::TranscriptReady => "Transcript ready",
            JobStatus::GeneratingSlides => "Generating slide content",
            JobStatus::CreatingPowerpoint => "Creating PowerPoint presentation",
            JobStatus::Completed => "Presentation ready for download",
            JobStatus::Error => "Processing failed",
        }
    }

    /// Stages during which a collaborator call is in flight.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            JobStatus::ExtractingAudio
                | JobStatus::Transcribing
                | JobStatus::GeneratingSlides
                | JobStatus::CreatingPowerpoint
        )
    }

    /// True once a transcript has been recorded and the job has not failed.
    pub fn has_transcript(&self) -> bool {
        !matches!(self, JobStatus::Error) && *self >= JobStatus::TranscriptReady
    }

    /// Advisory progress for the stage. `error` keeps whatever progress the
    /// job had reached.
    pub fn progress(&self) -> Option<u8> {
        match self {
            JobStatus::Uploaded => Some(0),
            JobStatus::ExtractingAudio => Some(20),
            JobStatus::Transcribing => Some(40),
            JobStatus::TranscriptReady => Some(60),
            JobStatus::GeneratingSlides => Some(80),
            JobStatus::CreatingPowerpoint => Some(90),
            JobStatus::Completed => Some(100),
            JobStatus::Error => None,
        }
    }

    /// The only successor of each non-terminal stage.
    pub fn next(&self) -> Option<JobStatus> {
        match self {
            JobStatus::Uploaded => Some(JobStatus::ExtractingAudio),
            JobStatus::ExtractingAudio => Some(JobStatus::Transcribing),
            JobStatus::Transcribing => Some(JobStatus::TranscriptReady),
            JobStatus::TranscriptReady => Some(JobStatus::GeneratingSlides),
            JobStatus::GeneratingSlides => Some(JobStatus::CreatingPowerpoint),
            JobStatus::CreatingPowerpoint => Some(JobStatus::Completed),
            JobStatus::Completed | JobStatus::Error => None,
        }
    }

    pub fn can_transition_to(&self, target: JobStatus) -> bool {
        if target == JobStatus::Error {
            return self.is_in_progress();
        }
        self.next() == Some(target)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single content slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
}

/// Structured deck produced from a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideContent {
    pub title: String,
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    /// Original upload filename.
    pub filename: String,
    pub format: MediaFormat,
    pub status: JobStatus,
    pub progress: u8,
    pub input_path: PathBuf,
    pub audio_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub transcript: Option<String>,
    pub slide_content: Option<SlideContent>,
    pub theme_id: Option<String>,
    pub error_detail: Option<String>,
    /// Stage that was running when the job entered `error`.
    pub failed_stage: Option<JobStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: JobId, filename: &str, format: MediaFormat, input_path: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            id,
            filename: filename.to_string(),
            format,
            status: JobStatus::Uploaded,
            progress: 0,
            input_path,
            audio_path: None,
            output_path: None,
            transcript: None,
            slide_content: None,
            theme_id: None,
            error_detail: None,
            failed_stage: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status_view(&self) -> JobStatusView {
        JobStatusView {
            job_id: self.id.clone(),
            status: self.status,
            progress: self.progress,
            message: self.status.describe().to_string(),
            error_detail: self.error_detail.clone(),
        }
    }

    /// Filename offered for the rendered deck, derived from the upload name.
    pub fn download_filename(&self) -> String {
        let stem = std::path::Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("presentation");
        format!("{}.pptx", stem)
    }
}

/// Observable status of a job, as returned by status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatusView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}
