use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use plugin_sync::SyncConfig;
use serde::Deserialize;

/// Optional settings file. Every field falls back to the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub file_name: Option<PathBuf>,
    pub update_center_url: Option<String>,
    pub plugins_dir: Option<PathBuf>,
    pub remove: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub fail_on_error: Option<bool>,
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub file_name: Option<PathBuf>,
    pub update_center_url: Option<String>,
    pub plugins_dir: Option<PathBuf>,
    pub remove: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub fail_on_error: Option<bool>,
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub sync: SyncConfig,
    pub timeout: Option<Duration>,
    pub fail_on_error: bool,
}

/// Load a config file. Unlike the manifest, a config file that was asked
/// for but cannot be parsed is an error rather than a silent fallback.
pub fn load_file(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Merge: command line over config file over defaults.
pub fn resolve(file: FileConfig, cli: Overrides) -> RunConfig {
    let defaults = SyncConfig::default();
    let sync = SyncConfig {
        manifest_path: cli
            .file_name
            .or(file.file_name)
            .unwrap_or(defaults.manifest_path),
        update_center_url: cli
            .update_center_url
            .or(file.update_center_url)
            .unwrap_or(defaults.update_center_url),
        plugins_dir: cli
            .plugins_dir
            .or(file.plugins_dir)
            .unwrap_or(defaults.plugins_dir),
        remove_unreferenced: cli
            .remove
            .or(file.remove)
            .unwrap_or(defaults.remove_unreferenced),
    };

    RunConfig {
        sync,
        timeout: cli
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs),
        fail_on_error: cli.fail_on_error.or(file.fail_on_error).unwrap_or(false),
    }
}
