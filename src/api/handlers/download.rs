use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::session::Session;
use crate::models::NewDownloadHistory;
use crate::services::artifact::ArtifactError;
use axum::{
    Extension,
    body::Body,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// `attachment` disposition with an ASCII fallback and an RFC 5987 `filename*`.
pub fn content_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "download.xlsx"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}

#[utoipa::path(
    get,
    path = "/api/download-excel",
    responses(
        (status = 200, description = "Consolidated spreadsheet", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 401, description = "Unknown session user"),
        (status = 404, description = "No spreadsheet has been generated yet"),
        (status = 500, description = "The spreadsheet could not be read"),
        (status = 503, description = "The spreadsheet is being replaced and the wait timed out")
    ),
    params(
        ("x-user-id" = Option<String>, Header, description = "Session user, defaults to the demo user")
    ),
    tag = "extraction"
)]
pub async fn download_excel(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    let snapshot = state.artifact.open().await.map_err(|e| match e {
        ArtifactError::Busy(_) => {
            AppError::Unavailable("Excel file is being updated, try again".to_string())
        }
        ArtifactError::Io(e) => {
            tracing::error!("Failed to open {}: {}", state.artifact.path().display(), e);
            AppError::Failure("Failed to download file".to_string())
        }
    })?;
    let Some(snapshot) = snapshot else {
        return Err(AppError::NotFound("Excel file not found".to_string()));
    };
    let size = snapshot.size();

    let filename = state.config.download_filename.clone();
    let record = NewDownloadHistory {
        user_id: session.user_id.clone(),
        filename: filename.clone(),
        file_type: Some("excel".to_string()),
        invoices_count: Some(snapshot.invoices_count().unwrap_or(0)),
        file_size: Some(size),
    };
    match state.storage.create_download_history(record).await {
        Ok(saved) => tracing::info!(
            "📊 {} downloaded {} ({} bytes, {} invoices)",
            session.user_id,
            filename,
            size,
            saved.invoices_count
        ),
        Err(e) => tracing::warn!("Failed to log download history: {}", e),
    }

    let body = Body::from_stream(snapshot.into_stream());

    let mut response = (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        body,
    )
        .into_response();

    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(size));

    Ok(response)
}
