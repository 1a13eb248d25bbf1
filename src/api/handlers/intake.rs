use crate::api::error::AppError;
use crate::services::extraction::UploadedPart;
use crate::utils::validation::{
    UploadRules, ValidationError, validate_declared, validate_file_size, verify_magic_bytes,
};
use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use bytes::BytesMut;
use std::collections::HashMap;

/// Multipart field carrying uploaded files
pub const FILES_FIELD: &str = "files";

/// Everything read from one multipart request.
///
/// `files` keeps every file part in submission order together with the
/// outcome of its checks; text fields are collected by name.
#[derive(Debug, Default)]
pub struct IntakeForm {
    pub files: Vec<(String, Result<UploadedPart, ValidationError>)>,
    pub fields: HashMap<String, String>,
}

impl IntakeForm {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// The first rejected file, if any.
    pub fn first_rejection(&self) -> Option<&ValidationError> {
        self.files.iter().find_map(|(_, outcome)| outcome.as_ref().err())
    }
}

pub fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}

/// Reads the whole multipart stream. File parts are checked as they arrive;
/// a rejected part is skipped without buffering the rest of it, and reading
/// continues so the stream is always drained.
pub async fn read_form(multipart: &mut Multipart, rules: &UploadRules) -> Result<IntakeForm, AppError> {
    let mut form = IntakeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILES_FIELD || field.file_name().is_some() {
            let original = field.file_name().unwrap_or("unnamed").to_string();
            let outcome = read_upload(field, rules).await?;
            form.files.push((original, outcome));
        } else {
            let text = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// Validates and buffers one file part.
///
/// The declared type is checked before any bytes are read, the size limit
/// while chunks arrive, and the magic bytes once the part is complete.
/// The outer error is a broken stream; the inner one a rejected file.
pub async fn read_upload(
    mut field: Field<'_>,
    rules: &UploadRules,
) -> Result<Result<UploadedPart, ValidationError>, AppError> {
    let original = field.file_name().unwrap_or("unnamed").to_string();
    let declared = field.content_type().map(|s| s.to_string());

    let (filename, content_type) = match validate_declared(&original, declared.as_deref(), rules) {
        Ok(checked) => checked,
        Err(e) => {
            tracing::warn!("Rejected upload {}: {}", original, e);
            return Ok(Err(e));
        }
    };

    let mut buffer = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if let Err(e) = validate_file_size(buffer.len() + chunk.len(), rules.max_file_size) {
            tracing::warn!("Rejected upload {}: {}", original, e);
            return Ok(Err(e));
        }
        buffer.extend_from_slice(&chunk);
    }

    let header_len = buffer.len().min(8192);
    if let Err(e) = verify_magic_bytes(&buffer[..header_len], &content_type) {
        tracing::warn!("Rejected upload {}: {}", original, e);
        return Ok(Err(e));
    }

    Ok(Ok(UploadedPart {
        filename,
        content_type,
        bytes: buffer.freeze(),
    }))
}
