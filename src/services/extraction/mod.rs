use crate::config::AppConfig;
use crate::services::artifact::ArtifactStore;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub mod output;
pub mod scratch;
pub mod types;

pub use output::parse_result;
pub use scratch::ScratchRun;
pub use types::{
    ExtractionError, ExtractionResult, ParseDiagnostics, UploadBatch, UploadedPart,
};

/// Environment variable naming the run's staged spreadsheet path the tool must write
pub const OUTPUT_PATH_ENV: &str = "GST_OUTPUT_PATH";
/// Environment variable naming the per-run structured result file
pub const RESULT_PATH_ENV: &str = "GST_RESULT_PATH";

/// Drives the external extraction tool, one child process per upload batch.
pub struct ExtractionService {
    config: AppConfig,
    artifact: Arc<ArtifactStore>,
}

impl ExtractionService {
    pub fn new(config: AppConfig, artifact: Arc<ArtifactStore>) -> Self {
        Self { config, artifact }
    }

    #[tracing::instrument(skip(self, batch), fields(files = batch.len(), bytes = batch.total_bytes()))]
    pub async fn extract(&self, batch: UploadBatch) -> Result<ExtractionResult, ExtractionError> {
        let run_id = Uuid::new_v4().to_string();
        let started = std::time::Instant::now();
        info!("🧾 Extraction run {} started", run_id);

        let scratch = ScratchRun::persist(&self.config.scratch_dir, &run_id, batch)
            .await
            .inspect_err(|e| error!("GST extraction error: {}", e))?;
        // Removed on every exit unless published below
        let staged = self.artifact.stage(&run_id);

        let outcome = self.run_extractor(&scratch, staged.path()).await;
        let result_file = scratch.read_result_file().await;
        scratch.release().await;

        let output = outcome?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("Extractor output: {}", stdout);
        if !stderr.trim().is_empty() {
            debug!("Extractor errors: {}", stderr);
        }

        if !output.status.success() {
            error!(
                "Extractor exited with {:?}; stderr: {}",
                output.status.code(),
                stderr
            );
            return Err(ExtractionError::ExitFailure {
                code: output.status.code(),
            });
        }

        let result = parse_result(result_file.as_deref(), &stdout, &self.config.result_marker)
            .ok_or_else(|| {
                error!(
                    "Failed to parse extractor output; stdout: {} stderr: {}",
                    stdout, stderr
                );
                ExtractionError::Parse {
                    diagnostics: self.config.expose_diagnostics.then(|| ParseDiagnostics {
                        output: stdout.to_string(),
                        error_output: stderr.to_string(),
                    }),
                }
            })?;

        if result.success {
            let published = self
                .artifact
                .publish(staged, result.invoices_count)
                .await
                .map_err(|e| {
                    error!("Failed to publish run {} output: {}", run_id, e);
                    ExtractionError::Publish(e)
                })?;
            if !published {
                warn!(
                    "Extractor reported success but wrote no spreadsheet; keeping {}",
                    self.artifact.path().display()
                );
            }
        }

        info!(
            duration_ms = started.elapsed().as_millis() as u64,
            success = result.success,
            invoices = ?result.invoices_count,
            "✅ Extraction run {} finished",
            run_id
        );
        Ok(result)
    }

    async fn run_extractor(
        &self,
        scratch: &ScratchRun,
        output_path: &Path,
    ) -> Result<Output, ExtractionError> {
        let mut command = Command::new(&self.config.extractor_program);
        command
            .args(&self.config.extractor_args)
            .args(scratch.paths())
            .env(
                &self.config.extractor_support_env,
                &self.config.extractor_support_path,
            )
            .env(OUTPUT_PATH_ENV, output_path)
            .env(RESULT_PATH_ENV, scratch.result_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| {
            error!(
                "Failed to spawn extractor `{}`: {}",
                self.config.extractor_program, source
            );
            ExtractionError::Spawn {
                program: self.config.extractor_program.clone(),
                source,
            }
        })?;

        // Both pipes are drained concurrently by wait_with_output. Dropping the
        // future on timeout drops the child, and kill_on_drop terminates it.
        match tokio::time::timeout(self.config.extraction_timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(ExtractionError::Wait),
            Err(_) => {
                warn!(
                    "⏱️  Extractor exceeded {:?}, killing it",
                    self.config.extraction_timeout
                );
                Err(ExtractionError::Timeout(self.config.extraction_timeout))
            }
        }
    }

    /// Whether the configured program can be found, either as a path or on `PATH`.
    pub fn extractor_available(&self) -> bool {
        resolve_program(&self.config.extractor_program).is_some()
    }
}

fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}
