use crate::driver::Driver;
use crate::errors::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `error_<descriptor>.png`, spaces replaced by underscores.
pub fn artifact_path(dir: &Path, descriptor: &str) -> PathBuf {
    dir.join(format!("error_{}.png", descriptor.replace(' ', "_")))
}

/// Capture the session's current viewport to a failure artifact.
pub async fn capture_failure<D: Driver>(
    driver: &D,
    dir: &Path,
    descriptor: &str,
) -> Result<PathBuf> {
    let bytes = driver.screenshot().await?;
    let path = artifact_path(dir, descriptor);
    tokio::fs::write(&path, bytes).await?;
    debug!(artifact = %path.display(), "failure screenshot written");
    Ok(path)
}
