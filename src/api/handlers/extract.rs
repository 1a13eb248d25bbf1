use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::intake::read_form;
use crate::services::extraction::{ExtractionResult, UploadBatch};
use crate::utils::validation::UploadRules;
use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use utoipa::ToSchema;

pub const DOWNLOAD_URL: &str = "/api/download-excel";

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractionResponse {
    pub success: bool,
    pub message: String,
    /// Present only when the run succeeded
    pub download_url: Option<String>,
    pub invoices_count: Option<u64>,
}

impl From<ExtractionResult> for ExtractionResponse {
    fn from(result: ExtractionResult) -> Self {
        Self {
            success: result.success,
            download_url: result.success.then(|| DOWNLOAD_URL.to_string()),
            message: result.message,
            invoices_count: result.invoices_count,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/extract-gst",
    request_body(content = Multipart, description = "Invoice files under the `files` field"),
    responses(
        (status = 200, description = "Extraction finished", body = ExtractionResponse),
        (status = 400, description = "No files, or too many files"),
        (status = 413, description = "A file exceeds the size limit"),
        (status = 415, description = "A file is not a PDF, PNG or JPEG"),
        (status = 500, description = "The extractor failed or its output could not be parsed"),
        (status = 504, description = "The extractor timed out")
    ),
    tag = "extraction"
)]
pub async fn extract_gst(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResponse>, AppError> {
    let rules = UploadRules::from_config(&state.config);
    let form = read_form(&mut multipart, &rules).await?;

    if form.file_count() == 0 {
        return Err(AppError::BadRequest("No files uploaded".to_string()));
    }
    if form.file_count() > rules.max_batch_files {
        return Err(AppError::BadRequest(format!(
            "Too many files: at most {} per request",
            rules.max_batch_files
        )));
    }
    if let Some(rejected) = form.first_rejection() {
        return Err(AppError::Validation(rejected.clone()));
    }

    let batch: UploadBatch = form
        .files
        .into_iter()
        .filter_map(|(_, outcome)| outcome.ok())
        .collect();

    tracing::info!(
        "📥 Received {} file(s) for extraction ({} bytes)",
        batch.len(),
        batch.total_bytes()
    );

    let result = state.extraction.extract(batch).await?;
    Ok(Json(result.into()))
}
