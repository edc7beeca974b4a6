//! Job lifecycle routes: upload, status, transcript, slides, download.
//!
//! Transcript and slide batches run on a spawned task, so a client that
//! disconnects mid-request does not abandon a job halfway through a stage.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use slidegen::{JobId, JobStatusView};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    GenerateSlidesRequest, GenerateSlidesResponse, TranscriptResponse, UploadResponse,
};
use crate::state::AppState;

/// Multipart field carrying the video.
const UPLOAD_FIELD: &str = "file";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/status/{job_id}", get(status))
        .route("/transcript/{job_id}", get(transcript))
        .route("/generate-slides/{job_id}", post(generate_slides))
        .route("/download/{job_id}", get(download))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await?;

        let job_id = state.service.create_job(&filename, &content).await?;
        return Ok(Json(UploadResponse {
            job_id,
            message: "File uploaded successfully".to_string(),
        }));
    }

    Err(ApiError::bad_request(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

async fn status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusView>> {
    Ok(Json(state.service.status(&JobId::from(job_id))?))
}

async fn transcript(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<TranscriptResponse>> {
    let job_id = JobId::from(job_id);
    let service = state.service.clone();
    let id = job_id.clone();
    let transcript = tokio::spawn(async move { service.transcript(&id).await }).await??;

    Ok(Json(TranscriptResponse {
        job_id,
        transcript,
    }))
}

async fn generate_slides(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<GenerateSlidesResponse>> {
    let request = parse_generate_request(&body)?;
    let job_id = JobId::from(job_id);

    let service = state.service.clone();
    let id = job_id.clone();
    let slide_content =
        tokio::spawn(async move { service.generate_slides(&id, request.theme.as_deref()).await })
            .await??;

    info!(job_id = %job_id, slides = slide_content.slides.len(), "Slides generated");
    Ok(Json(GenerateSlidesResponse {
        message: "Slides generated successfully".to_string(),
        slide_content,
    }))
}

/// An empty body selects the default theme.
fn parse_generate_request(body: &[u8]) -> ApiResult<GenerateSlidesRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateSlidesRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}

async fn download(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let artifact = state.service.download(&JobId::from(job_id)).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(artifact.content_type),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&artifact.filename))
            .map_err(|e| ApiError::internal(format!("Invalid header value: {e}")))?,
    );

    Ok((headers, artifact.bytes))
}

/// `attachment` disposition with the filename reduced to safe ASCII.
fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
