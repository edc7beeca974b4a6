use std::path::PathBuf;
use thiserror::Error;

use crate::job::{JobId, JobStatus};
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum SlidegenError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job already exists: {0}")]
    AlreadyExists(JobId),

    #[error("Cannot {operation} job {job_id} while it is {status}")]
    InvalidState {
        job_id: JobId,
        operation: &'static str,
        status: JobStatus,
    },

    #[error("Output file for job {0} is missing")]
    OutputMissing(JobId),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("{0}")]
    Stage(#[from] StageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure of one pipeline stage. Recorded on the job as its `error_detail`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Audio extraction failed: {0}")]
    Decode(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Slide generation failed: {0}")]
    Generation(String),

    #[error("Presentation rendering failed: {0}")]
    Render(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Secret resolution failed: {0}")]
    Secret(#[from] SecretError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, SlidegenError>;
