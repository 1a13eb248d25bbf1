use bytes::Bytes;
use futures::Stream;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact lock not acquired within {0:?}")]
    Busy(Duration),

    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default)]
struct ArtifactMeta {
    invoices_count: Option<u64>,
}

/// Owns the single well-known spreadsheet path.
///
/// Runs write to their own staged file and only take the write lock to rename
/// it into place. Downloads take the read lock just long enough to open the
/// file, then stream from the handle, so a reader of any speed never holds up
/// a run and never sees a half-written spreadsheet.
#[derive(Debug)]
pub struct ArtifactStore {
    path: PathBuf,
    lock_timeout: Duration,
    meta: RwLock<ArtifactMeta>,
}

impl ArtifactStore {
    pub fn new(path: PathBuf, lock_timeout: Duration) -> Self {
        Self {
            path,
            lock_timeout,
            meta: RwLock::new(ArtifactMeta::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unsynchronized existence probe, for health reporting only.
    pub async fn is_present(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Reserves a run-private output path beside the artifact.
    ///
    /// Same directory as the artifact, so publishing is a single rename.
    pub fn stage(&self, run_id: &str) -> StagedArtifact {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        StagedArtifact {
            path: self.path.with_file_name(format!(".{}.{}.partial", name, run_id)),
        }
    }

    /// Moves a finished run's output onto the well-known path and remembers
    /// its invoice count. Returns `false` when the run wrote nothing.
    pub async fn publish(
        &self,
        staged: StagedArtifact,
        invoices_count: Option<u64>,
    ) -> Result<bool, ArtifactError> {
        let mut meta = tokio::time::timeout(self.lock_timeout, self.meta.write())
            .await
            .map_err(|_| ArtifactError::Busy(self.lock_timeout))?;

        match tokio::fs::rename(staged.path(), &self.path).await {
            Ok(()) => {
                meta.invoices_count = invoices_count;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Opens the current artifact, or `None` when none has been generated.
    ///
    /// The handle keeps serving these bytes even if a later run replaces the
    /// file while the caller is still streaming.
    pub async fn open(&self) -> Result<Option<ArtifactSnapshot>, ArtifactError> {
        let meta = tokio::time::timeout(self.lock_timeout, self.meta.read())
            .await
            .map_err(|_| ArtifactError::Busy(self.lock_timeout))?;

        let file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Ok(None);
        }

        Ok(Some(ArtifactSnapshot {
            file,
            size: metadata.len(),
            invoices_count: meta.invoices_count,
        }))
    }
}

/// Output path of one run; removed on drop unless it was published.
#[derive(Debug)]
pub struct StagedArtifact {
    path: PathBuf,
}

impl StagedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove staged output {}: {}", self.path.display(), e),
        }
    }
}

/// An opened artifact together with what was known about it at open time
#[derive(Debug)]
pub struct ArtifactSnapshot {
    file: File,
    size: u64,
    invoices_count: Option<u64>,
}

impl ArtifactSnapshot {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn invoices_count(&self) -> Option<u64> {
        self.invoices_count
    }

    pub fn into_stream(self) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
        ReaderStream::new(self.file)
    }
}
