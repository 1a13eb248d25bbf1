use super::types::{ExtractionError, UploadBatch};
use chrono::Utc;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const RESULT_FILE: &str = "result.json";

/// Scratch copies of one batch, living in a directory owned by a single run.
///
/// `release` removes everything on the normal path; `Drop` covers every
/// other exit (early errors, panics, cancelled requests).
#[derive(Debug)]
pub struct ScratchRun {
    dir: PathBuf,
    files: Vec<PathBuf>,
    released: bool,
}

impl ScratchRun {
    /// Writes every part to `{root}/{run_id}/{unix_millis}_{filename}`.
    pub async fn persist(
        root: &Path,
        run_id: &str,
        batch: UploadBatch,
    ) -> Result<Self, ExtractionError> {
        let dir = root.join(run_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(ExtractionError::Persistence)?;

        let mut run = Self {
            dir,
            files: Vec::with_capacity(batch.len()),
            released: false,
        };

        let timestamp = Utc::now().timestamp_millis();
        let mut used = HashSet::new();
        for (index, part) in batch.into_iter().enumerate() {
            let mut name = format!("{}_{}", timestamp, part.filename);
            if !used.insert(name.clone()) {
                name = format!("{}_{}_{}", timestamp, index, part.filename);
                used.insert(name.clone());
            }

            let path = run.dir.join(name);
            // Tracked before writing so a half-written file is still released.
            run.files.push(path.clone());
            tokio::fs::write(&path, &part.bytes)
                .await
                .map_err(ExtractionError::Persistence)?;
            debug!("Persisted {} ({} bytes)", path.display(), part.bytes.len());
        }

        Ok(run)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the tool may write its structured result.
    pub fn result_path(&self) -> PathBuf {
        self.dir.join(RESULT_FILE)
    }

    pub async fn read_result_file(&self) -> Option<String> {
        tokio::fs::read_to_string(self.result_path()).await.ok()
    }

    /// Deletes every scratch file and the run directory. Failures are logged.
    pub async fn release(mut self) {
        let result_path = self.result_path();
        for path in self.files.iter().chain(std::iter::once(&result_path)) {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to cleanup temp file {}: {}", path.display(), e),
            }
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            warn!("Failed to remove scratch dir {}: {}", self.dir.display(), e);
        }
        self.released = true;
    }
}

impl Drop for ScratchRun {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let result_path = self.result_path();
        for path in self.files.iter().chain(std::iter::once(&result_path)) {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to cleanup temp file {}: {}", path.display(), e),
            }
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            warn!("Failed to remove scratch dir {}: {}", self.dir.display(), e);
        }
    }
}
