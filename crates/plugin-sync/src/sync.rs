use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::cleanup::{self, CleanupReport};
use crate::error::{EntryError, SyncError};
use crate::fetch::Fetcher;
use crate::layout::{DEFAULT_PLUGINS_DIR, PluginLayout};
use crate::manifest::{self, DEFAULT_MANIFEST, ManifestEntry};
use crate::specifier::Specifier;
use crate::staging;

/// Default update center base URL.
pub const DEFAULT_UPDATE_CENTER_URL: &str = "http://updates.jenkins-ci.org/stable";

/// Run configuration, built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub manifest_path: PathBuf,
    pub update_center_url: String,
    pub plugins_dir: PathBuf,
    /// Delete files in the plugins directory not written by this run.
    pub remove_unreferenced: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_MANIFEST),
            update_center_url: DEFAULT_UPDATE_CENTER_URL.to_owned(),
            plugins_dir: PathBuf::from(DEFAULT_PLUGINS_DIR),
            remove_unreferenced: false,
        }
    }
}

/// What happened to one manifest entry.
#[derive(Debug)]
pub enum EntryOutcome {
    Fetched {
        specifier: Specifier,
        path: PathBuf,
        bytes: u64,
        /// Set when a pin marker was written alongside the archive.
        pin: Option<PathBuf>,
    },
    Failed {
        specifier: Specifier,
        destination: PathBuf,
        /// The archive, if it landed before a later step (the pin marker) failed.
        installed: Option<PathBuf>,
        error: EntryError,
    },
    Rejected {
        line_number: usize,
        error: EntryError,
    },
}

impl EntryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }

    pub fn error(&self) -> Option<&EntryError> {
        match self {
            Self::Fetched { .. } => None,
            Self::Failed { error, .. } | Self::Rejected { error, .. } => Some(error),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub entries: Vec<EntryOutcome>,
    /// Plugin archives and pin markers written this run.
    pub written: BTreeSet<PathBuf>,
    /// `None` when the cleanup pass was not requested.
    pub cleanup: Option<CleanupReport>,
}

impl SyncReport {
    pub fn fetched(&self) -> usize {
        self.entries.iter().filter(|e| e.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.fetched()
    }

    pub fn removed(&self) -> &[PathBuf] {
        self.cleanup
            .as_ref()
            .map(|c| c.removed.as_slice())
            .unwrap_or_default()
    }

    /// True if every entry was fetched and cleanup (if any) removed everything it tried to.
    pub fn is_complete(&self) -> bool {
        self.failed() == 0 && self.cleanup.as_ref().is_none_or(|c| c.failed.is_empty())
    }
}

/// Brings a plugins directory in line with a manifest.
pub struct Synchronizer<'a> {
    config: &'a SyncConfig,
    layout: PluginLayout,
    fetcher: &'a dyn Fetcher,
}

impl<'a> Synchronizer<'a> {
    pub fn new(config: &'a SyncConfig, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            config,
            layout: PluginLayout::new(&config.plugins_dir),
            fetcher,
        }
    }

    /// Read the manifest, fetch every entry in order, then optionally prune.
    ///
    /// Per-entry failures are recorded in the report and never abort the run.
    /// Only an unreadable manifest or an unusable plugins directory is fatal.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let entries = manifest::read_manifest(&self.config.manifest_path).await?;

        let dir = self.layout.dir();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| SyncError::PluginsDir {
                path: dir.to_owned(),
                source,
            })?;

        tracing::debug!(
            entries = entries.len(),
            source = self.fetcher.label(),
            "syncing plugins"
        );

        let mut report = SyncReport::default();
        for entry in entries {
            let outcome = self.sync_entry(entry).await;
            match &outcome {
                EntryOutcome::Fetched { path, pin, .. } => {
                    report.written.insert(path.clone());
                    report.written.extend(pin.iter().cloned());
                }
                EntryOutcome::Failed {
                    installed: Some(path),
                    ..
                } => {
                    report.written.insert(path.clone());
                }
                _ => {}
            }
            report.entries.push(outcome);
        }

        if self.config.remove_unreferenced {
            report.cleanup = Some(cleanup::remove_unwritten(dir, &report.written).await?);
        }

        Ok(report)
    }

    async fn sync_entry(&self, entry: ManifestEntry) -> EntryOutcome {
        let specifier = match entry.parsed {
            Ok(spec) => spec,
            Err(source) => {
                let error = EntryError::InvalidSpecifier {
                    line: entry.line_number,
                    source,
                };
                tracing::warn!("Skipping manifest {error}");
                return EntryOutcome::Rejected {
                    line_number: entry.line_number,
                    error,
                };
            }
        };

        let name = &specifier.name;
        let url = specifier.remote_url(&self.config.update_center_url);
        let destination = self.layout.plugin_path(name);

        tracing::info!("Downloading {name}:{}", specifier.effective_version());

        let bytes =
            match staging::stage_download(self.fetcher, &self.layout, &url, &destination).await {
                Ok(bytes) => bytes,
                Err(error) => return self.failed(specifier, destination, None, error),
            };

        match self.mark(&specifier).await {
            Ok(pin) => EntryOutcome::Fetched {
                specifier,
                path: destination,
                bytes,
                pin,
            },
            Err(error) => {
                let installed = Some(destination.clone());
                self.failed(specifier, destination, installed, error)
            }
        }
    }

    /// Write the pin marker for unversioned entries, clear a stale one otherwise.
    async fn mark(&self, specifier: &Specifier) -> Result<Option<PathBuf>, EntryError> {
        let pin_path = self.layout.pin_path(&specifier.name);
        if specifier.is_pinned() {
            staging::write_pin_marker(&pin_path).await?;
            return Ok(Some(pin_path));
        }
        if staging::clear_pin_marker(&pin_path).await? {
            tracing::debug!(path = %pin_path.display(), "cleared stale pin marker");
        }
        Ok(None)
    }

    fn failed(
        &self,
        specifier: Specifier,
        destination: PathBuf,
        installed: Option<PathBuf>,
        error: EntryError,
    ) -> EntryOutcome {
        tracing::warn!(%error, "Did not download {}", destination.display());
        EntryOutcome::Failed {
            specifier,
            destination,
            installed,
            error,
        }
    }
}
