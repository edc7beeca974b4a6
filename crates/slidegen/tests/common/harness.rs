//! Test harness for isolated service execution.
//!
//! Each `TestHarness` owns a temporary data root and a `SlideService` wired
//! to scripted collaborators, so tests never touch ffmpeg or the network.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use slidegen::{Collaborators, Config, JobId, JobStatus, SlideService};

use super::fakes::{CallCounts, FakeExtractor, FakeRenderer, FakeStructurer, FakeTranscriber, Script};

pub struct TestHarness {
    /// Kept alive for the duration of the test.
    temp_dir: TempDir,
    pub data_dir: PathBuf,
    pub service: Arc<SlideService>,
    pub calls: Arc<CallCounts>,
}

impl TestHarness {
    /// Harness whose collaborators all succeed.
    pub async fn new() -> Self {
        Self::with_script(Script::default()).await
    }

    pub async fn with_script(script: Script) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_dir = temp_dir.path().join("data");

        let mut config = Config::default();
        config.storage.data_dir = data_dir.to_string_lossy().into_owned();

        let calls = Arc::new(CallCounts::default());
        let collaborators = Collaborators {
            extractor: Arc::new(FakeExtractor {
                script: script.clone(),
                calls: Arc::clone(&calls),
            }),
            transcriber: Arc::new(FakeTranscriber {
                script: script.clone(),
                calls: Arc::clone(&calls),
            }),
            structurer: Arc::new(FakeStructurer {
                script: script.clone(),
                calls: Arc::clone(&calls),
            }),
            renderer: Arc::new(FakeRenderer {
                script,
                calls: Arc::clone(&calls),
            }),
        };

        let service = SlideService::with_collaborators(&config, collaborators)
            .await
            .expect("Failed to build service");

        Self {
            temp_dir,
            data_dir,
            service: Arc::new(service),
            calls,
        }
    }

    /// Uploads a small fake video named `talk.mp4`.
    pub async fn upload(&self) -> JobId {
        self.service
            .create_job("talk.mp4", b"\x00\x00\x00\x18ftypmp42")
            .await
            .expect("upload should succeed")
    }

    /// Uploads and runs the transcript batch.
    pub async fn upload_transcribed(&self) -> JobId {
        let id = self.upload().await;
        self.service
            .transcript(&id)
            .await
            .expect("transcript should succeed");
        id
    }

    pub fn status(&self, id: &JobId) -> JobStatus {
        self.service.status(id).expect("job should exist").status
    }

    pub fn progress(&self, id: &JobId) -> u8 {
        self.service.status(id).expect("job should exist").progress
    }
}
