use crate::config::AppConfig;
use crate::infrastructure::seed::seed_demo_data;
use crate::services::storage::MemStorage;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage() -> Arc<MemStorage> {
    info!("🗄️  Storage: in-memory");
    let storage = MemStorage::new();
    seed_demo_data(&storage);
    Arc::new(storage)
}

/// Creates the scratch directory and the artifact's parent directory.
pub async fn prepare_directories(config: &AppConfig) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.scratch_dir).await?;
    if let Some(parent) = config.artifact_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    info!(
        "📂 Scratch dir: {}, artifact: {}",
        config.scratch_dir.display(),
        config.artifact_path.display()
    );
    Ok(())
}
