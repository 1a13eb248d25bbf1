use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::intake::read_form;
use crate::models::{FileStatus, NewUploadedFile, UploadedFile, UploadedFileUpdate};
use crate::utils::validation::UploadRules;
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadFilesResponse {
    pub files: Vec<UploadedFile>,
}

#[utoipa::path(
    post,
    path = "/api/files/upload",
    request_body(content = Multipart, description = "`userId` text field and one or more `files`"),
    responses(
        (status = 201, description = "One record per received file", body = UploadFilesResponse),
        (status = 400, description = "Missing user ID or no files")
    ),
    tag = "files"
)]
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadFilesResponse>), AppError> {
    let rules = UploadRules::from_config(&state.config);
    let form = read_form(&mut multipart, &rules).await?;

    let user_id = form
        .fields
        .get("userId")
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("User ID is required".to_string()))?;

    if form.file_count() == 0 {
        return Err(AppError::BadRequest("No files uploaded".to_string()));
    }

    let mut files = Vec::with_capacity(form.file_count());
    for (original, outcome) in form.files {
        let (record, update) = match outcome {
            Ok(part) => (
                NewUploadedFile {
                    user_id: user_id.clone(),
                    file_name: part.filename,
                    file_size: Some(part.bytes.len() as u64),
                    file_type: Some(part.content_type.clone()),
                    extracted_data: None,
                },
                UploadedFileUpdate {
                    status: Some(FileStatus::Completed),
                    extracted_data: Some(json!({ "contentType": part.content_type })),
                },
            ),
            Err(rejection) => (
                NewUploadedFile {
                    user_id: user_id.clone(),
                    file_name: original,
                    file_size: None,
                    file_type: None,
                    extracted_data: None,
                },
                UploadedFileUpdate {
                    status: Some(FileStatus::Error),
                    extracted_data: Some(json!({ "error": rejection.message })),
                },
            ),
        };

        let created = state.storage.create_uploaded_file(record).await?;
        let updated = state
            .storage
            .update_uploaded_file(&created.id, update)
            .await?
            .unwrap_or(created);
        files.push(updated);
    }

    tracing::info!("📁 {} recorded {} uploaded file(s)", user_id, files.len());
    Ok((StatusCode::CREATED, Json(UploadFilesResponse { files })))
}

#[utoipa::path(
    get,
    path = "/api/files/{user_id}",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Uploaded-file records", body = [UploadedFile])),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UploadedFile>>, AppError> {
    Ok(Json(state.storage.get_uploaded_files(&user_id).await?))
}
