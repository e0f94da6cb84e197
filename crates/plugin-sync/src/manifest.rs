use std::path::Path;

use crate::error::SyncError;
use crate::specifier::{Specifier, SpecifierError};

/// Default manifest file name, relative to the working directory.
pub const DEFAULT_MANIFEST: &str = "plugins.txt";

/// A non-blank manifest line and what it parsed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// 1-based line number in the manifest file.
    pub line_number: usize,
    pub parsed: Result<Specifier, SpecifierError>,
}

/// Parse manifest text into entries, in file order. Blank lines are dropped.
pub fn parse_manifest(text: &str) -> Vec<ManifestEntry> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let parsed = Specifier::parse(line).transpose()?;
            Some(ManifestEntry {
                line_number: idx + 1,
                parsed,
            })
        })
        .collect()
}

/// Read and parse the manifest at `path`.
///
/// Any failure to read the file, including non-UTF-8 content, is fatal.
pub async fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>, SyncError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SyncError::ManifestUnreadable {
            path: path.to_owned(),
            source,
        })?;
    Ok(parse_manifest(&text))
}
