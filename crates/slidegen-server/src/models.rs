//! Request and response bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slidegen::job::JobCounts;
use slidegen::{JobId, SlideContent, Theme};

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub jobs: JobCounts,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: JobId,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub job_id: JobId,
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct ThemesResponse<'a> {
    pub themes: &'a BTreeMap<String, Theme>,
    pub default: &'a str,
}

/// Body of `POST /generate-slides/{job_id}`. The whole body is optional.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateSlidesRequest {
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateSlidesResponse {
    pub message: String,
    pub slide_content: SlideContent,
}
