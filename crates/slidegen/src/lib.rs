pub mod broadcast;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod media;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod service;
pub mod storage;
pub mod theme;

pub use broadcast::{JobProgressBroadcaster, JobProgressEvent};
pub use collaborator::{
    AudioExtractor, CollaboratorError, Collaborators, ContentStructurer, PresentationRenderer,
    Transcriber,
};
pub use config::{load_config, load_config_or_default, Config};
pub use error::{ConfigError, Result, SlidegenError, StageError, StorageError};
pub use job::{Job, JobId, JobStatus, JobStatusView, JobStore, Slide, SlideContent};
pub use media::MediaFormat;
pub use service::{DownloadedArtifact, SlideService};
pub use theme::{Theme, ThemeRegistry};
