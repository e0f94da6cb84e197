use std::path::{Path, PathBuf};

/// Default plugins directory, relative to the working directory.
pub const DEFAULT_PLUGINS_DIR: &str = "ref/plugins";

/// Extension of installed plugin archives.
pub const PLUGIN_EXTENSION: &str = "jpi";

/// Suffix of the empty marker left next to a `latest`-resolved archive.
pub const PIN_SUFFIX: &str = ".pinned";

/// Suffix of the staging file a download is written to before the swap.
pub const STAGING_SUFFIX: &str = ".tmp";

/// File naming inside the plugins directory.
///
/// Layout:
/// - `dir/name.jpi`
/// - `dir/name.jpi.pinned`
/// - `dir/name.jpi.tmp` (only while a download is in flight)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLayout {
    dir: PathBuf,
}

impl PluginLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn plugin_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PLUGIN_EXTENSION}"))
    }

    pub fn pin_path(&self, name: &str) -> PathBuf {
        with_suffix(&self.plugin_path(name), PIN_SUFFIX)
    }

    pub fn staging_path(&self, destination: &Path) -> PathBuf {
        with_suffix(destination, STAGING_SUFFIX)
    }
}

impl Default for PluginLayout {
    fn default() -> Self {
        Self::new(DEFAULT_PLUGINS_DIR)
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
