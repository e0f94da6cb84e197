mod config;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use plugin_sync::Synchronizer;
use plugin_sync_http::UpdateCenterClient;
use tracing_subscriber::EnvFilter;

use crate::config::{FileConfig, Overrides};

#[derive(Parser)]
#[command(name = "update-plugins")]
#[command(about = "Update Jenkins plugins from an update center")]
struct Cli {
    /// Definition file to read (plugins.txt)
    #[arg(short = 'f', long)]
    file_name: Option<PathBuf>,

    /// Update center URL (http://updates.jenkins-ci.org/stable)
    #[arg(short = 'u', long)]
    update_center_url: Option<String>,

    /// Remove unreferenced plugins
    #[arg(short = 'r', long, overrides_with = "no_remove")]
    remove: bool,

    /// Don't remove unreferenced plugins (default)
    #[arg(long, overrides_with = "remove")]
    no_remove: bool,

    /// Directory holding the plugin archives (ref/plugins)
    #[arg(long)]
    plugins_dir: Option<PathBuf>,

    /// Give up on a download after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Exit with an error if any plugin could not be downloaded
    #[arg(long, overrides_with = "no_fail_on_error")]
    fail_on_error: bool,

    /// Exit successfully even if some plugins could not be downloaded (default)
    #[arg(long, overrides_with = "fail_on_error")]
    no_fail_on_error: bool,

    /// TOML file with defaults for any of the options above
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let remove = flag_pair(self.remove, self.no_remove);
        let fail_on_error = flag_pair(self.fail_on_error, self.no_fail_on_error);
        Overrides {
            file_name: self.file_name.clone(),
            update_center_url: self.update_center_url.clone(),
            plugins_dir: self.plugins_dir.clone(),
            remove,
            timeout_secs: self.timeout,
            fail_on_error,
        }
    }
}

/// Collapse a `--x` / `--no-x` pair into "on", "off", or "not given".
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let file = match &cli.config {
        Some(path) => config::load_file(path)?,
        None => FileConfig::default(),
    };
    let run = config::resolve(file, cli.overrides());

    let label = run.sync.update_center_url.clone();
    let client = match run.timeout {
        Some(timeout) => UpdateCenterClient::with_timeout(label, timeout)
            .context("failed to build HTTP client")?,
        None => UpdateCenterClient::new(label),
    };

    tracing::debug!(
        manifest = %run.sync.manifest_path.display(),
        plugins_dir = %run.sync.plugins_dir.display(),
        remove = run.sync.remove_unreferenced,
        "starting plugin update"
    );

    let report = match Synchronizer::new(&run.sync, &client).sync().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "plugin update aborted");
            return Err(e).context("plugin update aborted");
        }
    };

    report::print_summary(&report);

    if run.fail_on_error && !report.is_complete() {
        tracing::error!(failed = report.failed(), "plugin update incomplete");
        anyhow::bail!(
            "plugin update incomplete: {} of {} entries failed",
            report.failed(),
            report.entries.len()
        );
    }
    Ok(())
}
