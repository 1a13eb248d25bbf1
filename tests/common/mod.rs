#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use gst_extraction_backend::config::AppConfig;
use gst_extraction_backend::infrastructure::storage::{prepare_directories, setup_storage};
use gst_extraction_backend::services::storage::{MemStorage, Storage};
use gst_extraction_backend::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const BOUNDARY: &str = "---------------------------gstboundary7MA4YWxkTrZu0gW";

pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("gst_extraction_backend=debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

/// A router wired to a throwaway directory and a shell script standing in
/// for the extraction tool.
pub struct TestApp {
    pub dir: TempDir,
    pub storage: Arc<MemStorage>,
    pub state: AppState,
    pub app: Router,
}

impl TestApp {
    pub async fn new(script: &str) -> Self {
        Self::with_config(script, |_| {}).await
    }

    pub async fn with_config(script: &str, tweak: impl FnOnce(&mut AppConfig)) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();

        let script_path = dir.path().join("extractor.sh");
        std::fs::write(&script_path, script).unwrap();

        let mut config = AppConfig {
            scratch_dir: dir.path().join("scratch"),
            extractor_program: "sh".to_string(),
            extractor_args: vec![script_path.to_string_lossy().into_owned()],
            extractor_support_path: dir.path().join("support").to_string_lossy().into_owned(),
            artifact_path: dir.path().join("output").join("Consolidated_Invoices_Output.xlsx"),
            extraction_timeout: Duration::from_secs(10),
            ..AppConfig::default()
        };
        tweak(&mut config);
        prepare_directories(&config).await.unwrap();

        let storage = setup_storage().await;
        let state = AppState::new(storage.clone(), config);
        Self::from_state(dir, storage, state)
    }

    pub fn from_state(dir: TempDir, storage: Arc<MemStorage>, state: AppState) -> Self {
        let app = create_app(state.clone());
        Self {
            dir,
            storage,
            state,
            app,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn artifact_path(&self) -> &Path {
        &self.state.config.artifact_path
    }

    /// Files left anywhere under the scratch directory
    pub fn scratch_leftovers(&self) -> Vec<PathBuf> {
        fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    out.push(path);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.state.config.scratch_dir, &mut out);
        out
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn history(&self, user_id: &str) -> Vec<gst_extraction_backend::models::DownloadHistory> {
        self.storage.get_download_history(user_id).await.unwrap()
    }
}

/// One multipart part: field name, optional filename and content type, bytes.
pub struct Part<'a> {
    pub field: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

pub fn file<'a>(filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        field: "files",
        filename: Some(filename),
        content_type: Some(content_type),
        data,
    }
}

pub fn text<'a>(field: &'a str, value: &'a str) -> Part<'a> {
    Part {
        field,
        filename: None,
        content_type: None,
        data: value.as_bytes(),
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.field, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.field).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
