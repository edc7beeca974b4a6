use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::job::{Job, JobStatus};

/// Snapshot of a job published whenever it changes stage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    pub job_id: String,
    /// Original upload filename.
    pub filename: String,
    pub status: JobStatus,
    pub progress: u8,
    /// Human-readable description of the stage.
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    /// Error detail (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobProgressEvent {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            filename: job.filename.clone(),
            status: job.status,
            progress: job.progress,
            message: job.status.describe().to_string(),
            timestamp: job.updated_at,
            theme_id: job.theme_id.clone(),
            error: job.error_detail.clone(),
        }
    }
}

/// Fan-out of job progress events. Slow subscribers miss events rather than
/// holding up the pipeline.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: JobProgressEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for JobProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobId;
    use crate::media::MediaFormat;
    use std::path::PathBuf;

    fn job() -> Job {
        Job::new(
            JobId::from("job-1"),
            "talk.mp4",
            MediaFormat::Mp4,
            PathBuf::from("/data/uploads/job-1.mp4"),
        )
    }

    #[test]
    fn test_event_from_job() {
        let mut job = job();
        job.status = JobStatus::Error;
        job.progress = 40;
        job.error_detail = Some("Transcription failed: timeout".to_string());

        let event = JobProgressEvent::from_job(&job);
        assert_eq!(event.job_id, "job-1");
        assert_eq!(event.status, JobStatus::Error);
        assert_eq!(event.progress, 40);
        assert_eq!(event.error.as_deref(), Some("Transcription failed: timeout"));
    }

    #[test]
    fn test_event_serialization() {
        let event = JobProgressEvent::from_job(&job());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["jobId"], "job-1");
        assert_eq!(json["status"], "uploaded");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_broadcast_to_subscribers() {
        let broadcaster = JobProgressBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.receiver_count(), 1);

        broadcaster.send(JobProgressEvent::from_job(&job()));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.filename, "talk.mp4");
    }

    #[test]
    fn test_send_without_subscribers() {
        let broadcaster = JobProgressBroadcaster::default();
        broadcaster.send(JobProgressEvent::from_job(&job()));
    }
}
