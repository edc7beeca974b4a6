//! HTTP-level tests for the slidegen server.
//!
//! Each test builds the full router over a temp data root with in-process
//! collaborators and drives it with `tower::ServiceExt::oneshot`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use slidegen::collaborator::PptxRenderer;
use slidegen::{
    AudioExtractor, CollaboratorError, Collaborators, Config, ContentStructurer, Slide,
    SlideContent, SlideService, Theme, Transcriber,
};

const BOUNDARY: &str = "slidegen-test-boundary";

struct FakeExtractor {
    fail: bool,
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn extract_audio(&self, _video: &Path, audio_out: &Path) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::ProcessFailed {
                program: "ffmpeg".to_string(),
                code: Some(1),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }
        tokio::fs::write(audio_out, b"RIFF0000WAVE")
            .await
            .map_err(|e| CollaboratorError::Io {
                context: "fake wav".to_string(),
                source: e,
            })
    }
}

struct FakeTranscriber;

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &Path) -> Result<String, CollaboratorError> {
        Ok("hello world".to_string())
    }
}

struct FakeStructurer;

#[async_trait]
impl ContentStructurer for FakeStructurer {
    async fn structure(
        &self,
        _transcript: &str,
        _theme: &Theme,
    ) -> Result<SlideContent, CollaboratorError> {
        Ok(SlideContent {
            title: "Hello World".to_string(),
            slides: vec![Slide {
                title: "Greeting".to_string(),
                content: vec!["Say hello".to_string()],
            }],
        })
    }
}

struct TestApp {
    _temp_dir: TempDir,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_extraction(false).await
    }

    async fn with_extraction(fail: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = Config::default();
        config.storage.data_dir = temp_dir.path().to_string_lossy().into_owned();

        let collaborators = Collaborators {
            extractor: Arc::new(FakeExtractor { fail }),
            transcriber: Arc::new(FakeTranscriber),
            structurer: Arc::new(FakeStructurer),
            renderer: Arc::new(PptxRenderer::new()),
        };
        let service = SlideService::with_collaborators(&config, collaborators)
            .await
            .expect("Failed to build service");

        Self {
            _temp_dir: temp_dir,
            router: slidegen_server::build_router(Arc::new(service), &config.server),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    async fn upload(&self, filename: &str, content: &[u8]) -> (StatusCode, Value) {
        self.json(upload_request("file", filename, content)).await
    }

    async fn upload_ok(&self) -> String {
        let (status, body) = self.upload("talk.mp4", b"\x00\x00\x00\x18ftypmp42").await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["job_id"].as_str().unwrap().to_string()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_banner_and_health() {
    let app = TestApp::new().await;

    let (status, body) = app.json(get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Slide"));

    let (status, body) = app.json(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["jobs"]["total"], 0);
}

#[tokio::test]
async fn test_list_themes() {
    let app = TestApp::new().await;
    let (status, body) = app.json(get("/themes")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default"], "corporate_blue");
    let themes = body["themes"].as_object().unwrap();
    assert_eq!(themes.len(), 6);
    assert_eq!(themes["corporate_blue"]["colors"]["primary"], "#1F4E79");
}

#[tokio::test]
async fn test_upload_and_status() {
    let app = TestApp::new().await;
    let job_id = app.upload_ok().await;

    let (status, body) = app.json(get(&format!("/status/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job_id"], job_id.as_str());
    assert_eq!(body["status"], "uploaded");
    assert_eq!(body["progress"], 0);
    assert!(body.get("error_detail").is_none());
}

#[tokio::test]
async fn test_upload_rejects_unsupported_file() {
    let app = TestApp::new().await;
    let (status, body) = app.upload("notes.txt", b"hello").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNSUPPORTED_MEDIA");
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(upload_request("video", "talk.mp4", b"data"))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = TestApp::new().await;

    for uri in ["/status/nope", "/transcript/nope", "/download/nope"] {
        let (status, body) = app.json(get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_full_flow() {
    let app = TestApp::new().await;
    let job_id = app.upload_ok().await;

    let (status, body) = app.json(get(&format!("/transcript/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcript"], "hello world");

    let (status, body) = app
        .json(post_json(
            &format!("/generate-slides/{job_id}"),
            r#"{"theme": "modern_dark"}"#,
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["slide_content"]["title"], "Hello World");
    assert_eq!(body["slide_content"]["slides"][0]["content"][0], "Say hello");

    let (_, body) = app.json(get(&format!("/status/{job_id}"))).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["progress"], 100);

    let (status, headers, bytes) = app.send(get(&format!("/download/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.presentationml.presentation"
    );
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"talk.pptx\""
    );
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_generate_slides_without_body_uses_default_theme() {
    let app = TestApp::new().await;
    let job_id = app.upload_ok().await;
    app.json(get(&format!("/transcript/{job_id}"))).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/generate-slides/{job_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.json(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_generate_slides_before_transcript_conflicts() {
    let app = TestApp::new().await;
    let job_id = app.upload_ok().await;

    let (status, body) = app
        .json(post_json(&format!("/generate-slides/{job_id}"), "{}"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_unknown_theme_is_422() {
    let app = TestApp::new().await;
    let job_id = app.upload_ok().await;
    app.json(get(&format!("/transcript/{job_id}"))).await;

    let (status, body) = app
        .json(post_json(
            &format!("/generate-slides/{job_id}"),
            r#"{"theme": "nonexistent"}"#,
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "UNKNOWN_THEME");

    let (_, body) = app.json(get(&format!("/status/{job_id}"))).await;
    assert_eq!(body["status"], "transcript_ready");
}

#[tokio::test]
async fn test_malformed_generate_body_is_400() {
    let app = TestApp::new().await;
    let job_id = app.upload_ok().await;

    let (status, _) = app
        .json(post_json(&format!("/generate-slides/{job_id}"), "{theme"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extraction_failure_is_recorded() {
    let app = TestApp::with_extraction(true).await;
    let job_id = app.upload_ok().await;

    let (status, body) = app.json(get(&format!("/transcript/{job_id}"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "STAGE_FAILED");

    let (_, body) = app.json(get(&format!("/status/{job_id}"))).await;
    assert_eq!(body["status"], "error");
    assert!(body["error_detail"]
        .as_str()
        .unwrap()
        .contains("Invalid data found"));

    let (status, _) = app.json(get(&format!("/transcript/{job_id}"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_download_before_completion_conflicts() {
    let app = TestApp::new().await;
    let job_id = app.upload_ok().await;

    let (status, body) = app.json(get(&format!("/download/{job_id}"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/upload")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = app.send(request).await;
    assert!(status.is_success());
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}
