use std::path::{Path, PathBuf};

use plugin_sync::test_support::FakeFetcher;
use plugin_sync::{EntryError, EntryOutcome, SyncConfig, SyncError, Synchronizer};
use tempfile::TempDir;

const BASE: &str = "http://example.test";

struct Workspace {
    _dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new(manifest: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_owned();
        std::fs::write(root.join("plugins.txt"), manifest).unwrap();
        Self { _dir: dir, root }
    }

    fn config(&self, remove: bool) -> SyncConfig {
        SyncConfig {
            manifest_path: self.root.join("plugins.txt"),
            update_center_url: BASE.to_owned(),
            plugins_dir: self.plugins_dir(),
            remove_unreferenced: remove,
        }
    }

    fn plugins_dir(&self) -> PathBuf {
        self.root.join("ref").join("plugins")
    }

    fn plugin(&self, file: &str) -> PathBuf {
        self.plugins_dir().join(file)
    }

    fn seed(&self, file: &str, content: &[u8]) {
        std::fs::create_dir_all(self.plugins_dir()).unwrap();
        std::fs::write(self.plugin(file), content).unwrap();
    }

    fn listing(&self) -> Vec<String> {
        list_dir(&self.plugins_dir())
    }
}

fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn latest(name: &str) -> String {
    format!("{BASE}/latest/{name}.hpi")
}

fn versioned(name: &str, version: &str) -> String {
    format!("{BASE}/download/plugins/{name}/{version}/{name}.hpi")
}

#[tokio::test]
async fn end_to_end_fetches_versioned_and_pinned_plugins() {
    let ws = Workspace::new("analysis-core:1.74\ngit\n");
    let fetcher = FakeFetcher::new()
        .with_body(versioned("analysis-core", "1.74"), b"analysis".to_vec())
        .with_body(latest("git"), b"git".to_vec());
    let config = ws.config(false);

    let report = Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(
        fetcher.requests(),
        vec![
            "http://example.test/download/plugins/analysis-core/1.74/analysis-core.hpi".to_owned(),
            "http://example.test/latest/git.hpi".to_owned(),
        ]
    );
    assert_eq!(report.fetched(), 2);
    assert_eq!(report.failed(), 0);
    assert_eq!(
        ws.listing(),
        vec!["analysis-core.jpi", "git.jpi", "git.jpi.pinned"]
    );
    assert_eq!(std::fs::read(ws.plugin("analysis-core.jpi")).unwrap(), b"analysis");
    assert_eq!(std::fs::read(ws.plugin("git.jpi")).unwrap(), b"git");
    assert!(!ws.plugin("analysis-core.jpi.pinned").exists());
}

#[tokio::test]
async fn unversioned_entries_get_pin_markers() {
    let ws = Workspace::new("git\nmailer\ncredentials\n");
    let fetcher = FakeFetcher::new()
        .with_body(latest("git"), b"1".to_vec())
        .with_body(latest("mailer"), b"2".to_vec())
        .with_body(latest("credentials"), b"3".to_vec());
    let config = ws.config(false);

    let report = Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(report.fetched(), 3);
    for name in ["git", "mailer", "credentials"] {
        assert!(ws.plugin(&format!("{name}.jpi")).exists());
        let pin = ws.plugin(&format!("{name}.jpi.pinned"));
        assert_eq!(std::fs::metadata(&pin).unwrap().len(), 0);
    }
    assert_eq!(report.written.len(), 6);
}

#[tokio::test]
async fn explicit_latest_is_fetched_from_latest_but_not_pinned() {
    let ws = Workspace::new("git:latest\n");
    let fetcher = FakeFetcher::new().with_body(latest("git"), b"g".to_vec());
    let config = ws.config(false);

    Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(fetcher.requests(), vec![latest("git")]);
    assert_eq!(ws.listing(), vec!["git.jpi"]);
}

#[tokio::test]
async fn versioned_fetch_clears_stale_pin_marker() {
    let ws = Workspace::new("git:4.0\n");
    ws.seed("git.jpi", b"old latest");
    ws.seed("git.jpi.pinned", b"");
    let fetcher = FakeFetcher::new().with_body(versioned("git", "4.0"), b"4.0".to_vec());
    let config = ws.config(false);

    Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(ws.listing(), vec!["git.jpi"]);
    assert_eq!(std::fs::read(ws.plugin("git.jpi")).unwrap(), b"4.0");
}

#[tokio::test]
async fn failed_entry_does_not_stop_the_run() {
    let ws = Workspace::new("broken\ngit\n");
    let fetcher = FakeFetcher::new()
        .with_network_error(latest("broken"), "connection refused")
        .with_body(latest("git"), b"git".to_vec());
    let config = ws.config(false);

    let report = Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(report.fetched(), 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_complete());
    match &report.entries[0] {
        EntryOutcome::Failed {
            destination,
            installed,
            error,
            ..
        } => {
            assert_eq!(destination, &ws.plugin("broken.jpi"));
            assert!(installed.is_none());
            assert!(matches!(error, EntryError::FetchFailed { .. }));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(ws.listing(), vec!["git.jpi", "git.jpi.pinned"]);
}

#[tokio::test]
async fn malformed_lines_are_rejected_and_skipped() {
    let ws = Workspace::new("a:b:c\ngit:\n:1.0\n\ngit\n");
    let fetcher = FakeFetcher::new().with_body(latest("git"), b"git".to_vec());
    let config = ws.config(false);

    let report = Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(fetcher.requests(), vec![latest("git")]);
    let rejected: Vec<usize> = report
        .entries
        .iter()
        .filter_map(|e| match e {
            EntryOutcome::Rejected { line_number, .. } => Some(*line_number),
            _ => None,
        })
        .collect();
    assert_eq!(rejected, vec![1, 2, 3]);
    assert_eq!(report.fetched(), 1);
}

#[tokio::test]
async fn interrupted_download_keeps_previous_archive() {
    let ws = Workspace::new("git\n");
    ws.seed("git.jpi", b"known good");
    let fetcher = FakeFetcher::new().with_truncated_body(latest("git"), b"kno".to_vec());
    let config = ws.config(false);

    let report = Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(std::fs::read(ws.plugin("git.jpi")).unwrap(), b"known good");
    assert_eq!(ws.listing(), vec!["git.jpi"]);
}

#[tokio::test]
async fn cleanup_removes_exactly_unreferenced_files() {
    let ws = Workspace::new("A\nB\n");
    ws.seed("A.jpi", b"a");
    ws.seed("B.jpi", b"b");
    ws.seed("B.jpi.pinned", b"");
    ws.seed("C.jpi", b"c");
    let fetcher = FakeFetcher::new()
        .with_body(latest("A"), b"a".to_vec())
        .with_body(latest("B"), b"b".to_vec());
    let config = ws.config(true);

    let report = Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(report.removed(), &[ws.plugin("C.jpi")]);
    assert_eq!(
        ws.listing(),
        vec!["A.jpi", "A.jpi.pinned", "B.jpi", "B.jpi.pinned"]
    );
}

#[tokio::test]
async fn without_cleanup_nothing_is_removed() {
    let ws = Workspace::new("A\nB\n");
    ws.seed("C.jpi", b"c");
    let fetcher = FakeFetcher::new()
        .with_body(latest("A"), b"a".to_vec())
        .with_body(latest("B"), b"b".to_vec());
    let config = ws.config(false);

    let report = Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert!(report.cleanup.is_none());
    assert!(report.removed().is_empty());
    assert!(ws.plugin("C.jpi").exists());
}

#[tokio::test]
async fn cleanup_removes_plugin_whose_fetch_failed() {
    let ws = Workspace::new("git\n");
    ws.seed("git.jpi", b"stale");
    let fetcher = FakeFetcher::new().with_status(latest("git"), 500);
    let config = ws.config(true);

    let report = Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(report.removed(), &[ws.plugin("git.jpi")]);
    assert!(ws.listing().is_empty());
}

#[tokio::test]
async fn pin_marker_failure_keeps_installed_archive() {
    let ws = Workspace::new("git\n");
    std::fs::create_dir_all(ws.plugin("git.jpi.pinned")).unwrap();
    ws.seed("other.jpi", b"other");
    let fetcher = FakeFetcher::new().with_body(latest("git"), b"git".to_vec());
    let config = ws.config(true);

    let report = Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(report.fetched(), 0);
    assert_eq!(report.failed(), 1);
    match &report.entries[0] {
        EntryOutcome::Failed {
            installed, error, ..
        } => {
            assert_eq!(installed.as_deref(), Some(ws.plugin("git.jpi").as_path()));
            match error {
                EntryError::WriteFailed { path, .. } => {
                    assert_eq!(path, &ws.plugin("git.jpi.pinned"));
                }
                other => panic!("expected WriteFailed, got {other:?}"),
            }
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(report.written.contains(&ws.plugin("git.jpi")));
    assert_eq!(report.removed(), &[ws.plugin("other.jpi")]);
    assert_eq!(std::fs::read(ws.plugin("git.jpi")).unwrap(), b"git");
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let ws = Workspace::new("analysis-core:1.74\ngit\n");
    let fetcher = FakeFetcher::new()
        .with_body(versioned("analysis-core", "1.74"), b"analysis".to_vec())
        .with_body(latest("git"), b"git".to_vec());
    let config = ws.config(true);
    let sync = Synchronizer::new(&config, &fetcher);

    sync.sync().await.unwrap();
    let first = ws.listing();
    let report = sync.sync().await.unwrap();

    assert_eq!(ws.listing(), first);
    assert!(report.removed().is_empty());
    assert_eq!(std::fs::read(ws.plugin("git.jpi")).unwrap(), b"git");
}

#[tokio::test]
async fn missing_manifest_is_fatal_before_any_fetch() {
    let ws = Workspace::new("");
    let mut config = ws.config(true);
    config.manifest_path = ws.root.join("missing.txt");
    ws.seed("keep.jpi", b"k");
    let fetcher = FakeFetcher::new();

    let result = Synchronizer::new(&config, &fetcher).sync().await;

    assert!(matches!(result, Err(SyncError::ManifestUnreadable { .. })));
    assert!(fetcher.requests().is_empty());
    assert_eq!(ws.listing(), vec!["keep.jpi"]);
}

#[tokio::test]
async fn plugins_directory_is_created_when_missing() {
    let ws = Workspace::new("git:1.0\n");
    let fetcher = FakeFetcher::new().with_body(versioned("git", "1.0"), b"1".to_vec());
    let config = ws.config(false);

    assert!(!ws.plugins_dir().exists());
    Synchronizer::new(&config, &fetcher).sync().await.unwrap();

    assert_eq!(ws.listing(), vec!["git.jpi"]);
}
