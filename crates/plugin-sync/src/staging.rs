use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::EntryError;
use crate::fetch::{FetchError, Fetcher};
use crate::layout::PluginLayout;

/// Download `url` into `destination` without ever exposing a partial file.
///
/// The body is streamed into a staging file next to the destination and
/// renamed over it only once fully written and synced. On any failure the
/// staging file is removed and the destination is left as it was.
pub async fn stage_download(
    fetcher: &dyn Fetcher,
    layout: &PluginLayout,
    url: &str,
    destination: &Path,
) -> Result<u64, EntryError> {
    let staging = layout.staging_path(destination);

    let bytes = match write_staged(fetcher, url, &staging).await {
        Ok(bytes) => bytes,
        Err(e) => {
            discard(&staging).await;
            return Err(e);
        }
    };

    if let Err(source) = fs::rename(&staging, destination).await {
        discard(&staging).await;
        return Err(EntryError::WriteFailed {
            path: destination.to_owned(),
            source,
        });
    }

    tracing::debug!(path = %destination.display(), bytes, "installed");
    Ok(bytes)
}

async fn write_staged(
    fetcher: &dyn Fetcher,
    url: &str,
    staging: &Path,
) -> Result<u64, EntryError> {
    let write_failed = |source| EntryError::WriteFailed {
        path: staging.to_owned(),
        source,
    };

    let mut file = fs::File::create(staging).await.map_err(write_failed)?;

    let bytes = fetcher
        .fetch(url, &mut file)
        .await
        .map_err(|e| match e {
            FetchError::Write(source) => write_failed(source),
            other => EntryError::FetchFailed {
                url: url.to_owned(),
                source: other,
            },
        })?;

    file.flush().await.map_err(write_failed)?;
    file.sync_all().await.map_err(write_failed)?;
    Ok(bytes)
}

async fn discard(staging: &Path) {
    match fs::remove_file(staging).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %staging.display(), error = %e, "could not remove staging file");
        }
    }
}

/// Write an empty pin marker.
pub async fn write_pin_marker(path: &Path) -> Result<(), EntryError> {
    fs::write(path, b"")
        .await
        .map_err(|source| EntryError::WriteFailed {
            path: path.to_owned(),
            source,
        })
}

/// Remove a pin marker if one exists. Returns true if a marker was removed.
pub async fn clear_pin_marker(path: &Path) -> Result<bool, EntryError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(EntryError::WriteFailed {
            path: path.to_owned(),
            source,
        }),
    }
}
