use crate::config::AppConfig;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use utoipa::ToSchema;

/// Upload constraints shared by the server and the client pre-filter
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadRules {
    pub allowed_mime_types: Vec<String>,
    pub max_file_size: usize,
    pub max_batch_files: usize,
}

impl UploadRules {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            allowed_mime_types: config.allowed_mime_types.clone(),
            max_file_size: config.max_file_size,
            max_batch_files: config.max_batch_files,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

pub const FILE_TOO_LARGE: &str = "FILE_TOO_LARGE";
pub const INVALID_MIME_TYPE: &str = "INVALID_MIME_TYPE";
pub const CONTENT_MISMATCH: &str = "CONTENT_MISMATCH";

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError {
            code: FILE_TOO_LARGE,
            message: format!(
                "File size exceeds maximum allowed {} bytes ({} MB)",
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Lowercases, strips parameters and folds browser aliases onto canonical types.
pub fn normalize_mime(content_type: &str) -> String {
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match normalized.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/x-png" => "image/png".to_string(),
        "application/x-pdf" => "application/pdf".to_string(),
        _ => normalized,
    }
}

/// Validates MIME type against the allow-list, returning the normalized type
pub fn validate_mime_type(content_type: &str, rules: &UploadRules) -> Result<String, ValidationError> {
    let normalized = normalize_mime(content_type);

    if rules
        .allowed_mime_types
        .iter()
        .any(|allowed| allowed == &normalized)
    {
        return Ok(normalized);
    }

    Err(ValidationError {
        code: INVALID_MIME_TYPE,
        message: format!(
            "Invalid file type '{}'. Only PDF, PNG and JPEG files are allowed.",
            content_type
        ),
    })
}

/// Sanitizes filename to prevent path traversal and injection attacks
/// Returns the sanitized filename or an error if the name is invalid
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    // Browsers on Windows may send the full client path.
    let last_segment = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let name = Path::new(last_segment)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Leaves room for the timestamp prefix within common 255-byte name limits.
    let sanitized = if sanitized.len() > 200 {
        let mut end = 200;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.starts_with('.') {
        return Err(ValidationError {
            code: "HIDDEN_FILE",
            message: "Hidden files (starting with '.') are not allowed".to_string(),
        });
    }

    Ok(sanitized)
}

/// Checks if file content appears to be executable
pub fn is_executable_content(header: &[u8]) -> bool {
    if header.len() < 4 {
        return false;
    }

    // ELF
    if header.starts_with(&[0x7F, 0x45, 0x4C, 0x46]) {
        return true;
    }

    // PE/COFF
    if header.starts_with(&[0x4D, 0x5A]) {
        return true;
    }

    // Mach-O
    if header.starts_with(&[0xFE, 0xED, 0xFA, 0xCE])
        || header.starts_with(&[0xFE, 0xED, 0xFA, 0xCF])
        || header.starts_with(&[0xCE, 0xFA, 0xED, 0xFE])
        || header.starts_with(&[0xCF, 0xFA, 0xED, 0xFE])
    {
        return true;
    }

    header.starts_with(b"#!")
}

/// Verifies the leading bytes agree with the declared type. Content that
/// `infer` cannot classify is let through.
pub fn verify_magic_bytes(header: &[u8], claimed_mime: &str) -> Result<(), ValidationError> {
    if header.is_empty() {
        return Err(ValidationError {
            code: "EMPTY_FILE",
            message: "File appears to be empty".to_string(),
        });
    }

    if is_executable_content(header) {
        return Err(ValidationError {
            code: CONTENT_MISMATCH,
            message: "File contains executable content which is not allowed".to_string(),
        });
    }

    match infer::get(header) {
        Some(kind) if kind.mime_type() != claimed_mime => Err(ValidationError {
            code: CONTENT_MISMATCH,
            message: format!(
                "File content looks like '{}' but was declared as '{}'",
                kind.mime_type(),
                claimed_mime
            ),
        }),
        Some(_) => Ok(()),
        None => {
            tracing::debug!(
                "No magic bytes match for claimed MIME type '{}', allowing anyway",
                claimed_mime
            );
            Ok(())
        }
    }
}

/// Checks what a part claims to be before any of its bytes are read.
/// Returns the sanitized name and normalized MIME type.
pub fn validate_declared(
    filename: &str,
    content_type: Option<&str>,
    rules: &UploadRules,
) -> Result<(String, String), ValidationError> {
    let sanitized = sanitize_filename(filename)?;
    let mime = validate_mime_type(content_type.unwrap_or("application/octet-stream"), rules)?;
    Ok((sanitized, mime))
}
