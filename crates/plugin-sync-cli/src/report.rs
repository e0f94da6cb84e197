use plugin_sync::{EntryOutcome, SyncReport};

/// Print the end-of-run summary to stdout.
pub fn print_summary(report: &SyncReport) {
    println!("{}", summary(report));
}

fn summary(report: &SyncReport) -> String {
    let failed: Vec<String> = report
        .entries
        .iter()
        .filter_map(|outcome| match outcome {
            EntryOutcome::Failed { specifier, .. } => Some(specifier.to_string()),
            EntryOutcome::Rejected { line_number, .. } => Some(format!("line {line_number}")),
            EntryOutcome::Fetched { .. } => None,
        })
        .collect();

    let mut msg = format!("Downloaded {}", count(report.fetched(), "plugin", "plugins"));
    if !failed.is_empty() {
        msg.push_str(&format!(" ({} failed: {})", failed.len(), failed.join(", ")));
    }
    if let Some(cleanup) = &report.cleanup {
        msg.push_str(&format!(
            ", removed {}",
            count(cleanup.removed.len(), "unreferenced file", "unreferenced files")
        ));
        if !cleanup.failed.is_empty() {
            msg.push_str(&format!(" ({} could not be removed)", cleanup.failed.len()));
        }
    }
    msg.push('.');
    msg
}

fn count(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}
