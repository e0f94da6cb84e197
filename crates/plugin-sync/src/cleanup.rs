use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::SyncError;

/// Result of a cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

/// Delete every file directly under `dir` that is not in `written`.
///
/// Directories are left alone. A missing `dir` removes nothing. Failure to
/// delete an individual file is recorded and does not stop the pass.
pub async fn remove_unwritten(
    dir: &Path,
    written: &BTreeSet<PathBuf>,
) -> Result<CleanupReport, SyncError> {
    let listing_failed = |source| SyncError::Cleanup {
        path: dir.to_owned(),
        source,
    };

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CleanupReport::default());
        }
        Err(e) => return Err(listing_failed(e)),
    };

    let mut stale = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(listing_failed)? {
        let file_type = entry.file_type().await.map_err(listing_failed)?;
        if file_type.is_dir() {
            continue;
        }
        let path = dir.join(entry.file_name());
        if !written.contains(&path) {
            stale.push(path);
        }
    }
    stale.sort();

    Ok(remove_files(stale).await)
}

/// Remove each path in turn, recording failures instead of stopping.
async fn remove_files(paths: Vec<PathBuf>) -> CleanupReport {
    let mut report = CleanupReport::default();
    for path in paths {
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed unreferenced file");
                report.removed.push(path);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not remove unreferenced file");
                report.failed.push((path, e));
            }
        }
    }
    report
}
