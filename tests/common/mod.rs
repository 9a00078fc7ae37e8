//! Shared harness for the HTTP-level tests.
//!
//! [`TestHarness`] wires the real router to a fresh temporary uploads
//! directory. [`TestHarness::with_server`] additionally serves it on a random
//! local port for tests that go through the HTTP client.

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime},
};

use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use slideshow_service::{
    adapters::{router::build_router, state::AppState},
    application::services::{ListingService, UploadService},
    domain::config::ServerConfig,
    services::FsImageRepository,
};
use tempfile::TempDir;

pub const BOUNDARY: &str = "slideshow-test-boundary-7MA4YWxkTrZu0gW";

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01";
pub const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00\x01\x01\x00";
pub const SVG: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"1\" height=\"1\"/>";

pub struct TestHarness {
    pub dir: TempDir,
    pub state: AppState,
}

impl TestHarness {
    /// Harness whose uploads directory does not exist yet.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let uploads_dir = dir.path().join("uploads");
        Self::build(dir, uploads_dir, None)
    }

    /// Harness with a fixed upload clock.
    pub fn with_clock(clock: fn() -> i64) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let uploads_dir = dir.path().join("uploads");
        Self::build(dir, uploads_dir, Some(clock))
    }

    /// Harness whose uploads directory can never be created.
    pub fn with_blocked_directory() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").expect("failed to write blocker");
        Self::build(dir, blocker.join("uploads"), None)
    }

    fn build(dir: TempDir, uploads_dir: PathBuf, clock: Option<fn() -> i64>) -> Self {
        let config = ServerConfig {
            uploads_dir: uploads_dir.clone(),
            ..ServerConfig::default()
        };
        let repository = Arc::new(FsImageRepository::new(uploads_dir));

        let mut upload_service = UploadService::new(repository.clone());
        if let Some(clock) = clock {
            upload_service = upload_service.with_clock(clock);
        }

        let state = AppState {
            config: Arc::new(config),
            upload_service: Arc::new(upload_service),
            listing_service: Arc::new(ListingService::new(repository)),
        };

        Self { dir, state }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.state.config.uploads_dir
    }

    /// Files currently in the uploads directory, sorted by name.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.uploads_dir()) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Writes a file directly into the uploads directory with the given mtime.
    pub fn seed(&self, name: &str, content: &[u8], mtime_secs: u64) {
        std::fs::create_dir_all(self.uploads_dir()).unwrap();
        let path = self.uploads_dir().join(name);
        std::fs::write(&path, content).unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs))
            .unwrap();
    }

    /// Serves the router on a random local port.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = harness.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Multipart body with one file field.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
