use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the intake and extraction pipeline
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum size of a single uploaded file in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Maximum number of files accepted in one extraction request (default: 20)
    pub max_batch_files: usize,

    /// MIME types accepted at intake. This list is also served to the client
    /// so its pre-filter never disagrees with the server.
    pub allowed_mime_types: Vec<String>,

    /// Directory holding per-run scratch copies of uploaded files
    pub scratch_dir: PathBuf,

    /// External extraction program (default: "python")
    pub extractor_program: String,

    /// Arguments placed before the uploaded file paths
    pub extractor_args: Vec<String>,

    /// Environment variable through which the tool finds its support modules
    pub extractor_support_env: String,

    /// Value of `extractor_support_env`
    pub extractor_support_path: String,

    /// Well-known path of the consolidated spreadsheet produced by the tool
    pub artifact_path: PathBuf,

    /// Upper bound on a single extraction run
    pub extraction_timeout: Duration,

    /// Upper bound on waiting for the artifact lock when publishing or opening
    pub artifact_lock_timeout: Duration,

    /// Token preceding the JSON result line on the tool's stdout
    pub result_marker: String,

    /// Name offered to the browser for the downloaded spreadsheet
    pub download_filename: String,

    /// Identity used when a request carries no `x-user-id` header
    pub default_user_id: String,

    /// Attach raw tool output to parse-failure responses
    pub expose_diagnostics: bool,

    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024, // 50 MB
            max_batch_files: 20,
            allowed_mime_types: vec![
                mime::APPLICATION_PDF.to_string(),
                mime::IMAGE_PNG.to_string(),
                mime::IMAGE_JPEG.to_string(),
            ],
            scratch_dir: PathBuf::from("temp_uploads"),
            extractor_program: "python".to_string(),
            extractor_args: vec!["python_backend/simple_server.py".to_string()],
            extractor_support_env: "PYTHONPATH".to_string(),
            extractor_support_path: "python_backend".to_string(),
            artifact_path: PathBuf::from("python_backend/output/Consolidated_Invoices_Output.xlsx"),
            extraction_timeout: Duration::from_secs(300),
            artifact_lock_timeout: Duration::from_secs(30),
            result_marker: "[RESULT]".to_string(),
            download_filename: "GST_Invoices_Extract.xlsx".to_string(),
            default_user_id: "user-1".to_string(),
            expose_diagnostics: false,
            allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            max_batch_files: env::var("MAX_BATCH_FILES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_batch_files),

            allowed_mime_types: env::var("ALLOWED_MIME_TYPES")
                .ok()
                .map(|v| split_list(&v).into_iter().map(|m| m.to_lowercase()).collect())
                .unwrap_or(default.allowed_mime_types),

            scratch_dir: env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.scratch_dir),

            extractor_program: env::var("EXTRACTOR_PROGRAM").unwrap_or(default.extractor_program),

            extractor_args: env::var("EXTRACTOR_ARGS")
                .ok()
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or(default.extractor_args),

            extractor_support_env: env::var("EXTRACTOR_SUPPORT_ENV")
                .unwrap_or(default.extractor_support_env),

            extractor_support_path: env::var("EXTRACTOR_SUPPORT_PATH")
                .unwrap_or(default.extractor_support_path),

            artifact_path: env::var("ARTIFACT_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.artifact_path),

            extraction_timeout: env::var("EXTRACTION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.extraction_timeout),

            artifact_lock_timeout: env::var("ARTIFACT_LOCK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.artifact_lock_timeout),

            result_marker: env::var("RESULT_MARKER").unwrap_or(default.result_marker),

            download_filename: env::var("DOWNLOAD_FILENAME").unwrap_or(default.download_filename),

            default_user_id: env::var("DEFAULT_USER_ID").unwrap_or(default.default_user_id),

            expose_diagnostics: env::var("EXPOSE_DIAGNOSTICS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.expose_diagnostics),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| split_list(&v))
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development (raw tool output attached to parse failures)
    pub fn development() -> Self {
        Self {
            expose_diagnostics: true,
            extraction_timeout: Duration::from_secs(600),
            ..Self::default()
        }
    }

    /// Create config for production (no diagnostics leak, tighter timeout)
    pub fn production() -> Self {
        let mut config = Self::from_env();
        config.expose_diagnostics = false;
        if config.extraction_timeout > Duration::from_secs(300) {
            config.extraction_timeout = Duration::from_secs(300);
        }
        config
    }

    /// Body limit for a multipart request carrying a full batch
    pub fn max_request_size(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_batch_files)
            .saturating_add(10 * 1024 * 1024) // multipart overhead
    }
}
