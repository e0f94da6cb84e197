use std::path::PathBuf;

use crate::fetch::FetchError;
use crate::specifier::SpecifierError;

/// Fatal errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("cannot read manifest {}: {source}", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot prepare plugins directory {}: {source}", path.display())]
    PluginsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot list plugins directory {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single manifest entry was skipped. Never aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("line {line}: {source}")]
    InvalidSpecifier {
        line: usize,
        #[source]
        source: SpecifierError,
    },

    #[error("fetching {url} failed: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("writing {} failed: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
