use std::path::Path;

use crate::JobReport;
use crate::engine::tools::path_relative_to;
use crate::pipeline::SkippedDirs;
use crate::utils::config::FAILURE_LIST_LIMIT;

/// Warn about subdirectories skipped during discovery; list them when verbose.
pub fn report_skipped_dirs(verbose: bool, skipped: &SkippedDirs) {
    let Ok(skipped) = skipped.lock() else {
        return;
    };
    if skipped.is_empty() {
        return;
    }
    log::warn!(
        "Skipped {} directories due to permission errors or access issues",
        skipped.len()
    );
    if verbose {
        for (p, msg) in skipped.iter() {
            eprintln!("  skipped: {} ({})", p.display(), msg);
        }
    }
}

/// Print each per-file failure (paths relative to `root`), up to a limit.
pub fn list_failures(report: &JobReport, root: &Path) {
    let total = report.failed();
    for outcome in report.failures().take(FAILURE_LIST_LIMIT) {
        let shown = path_relative_to(&outcome.path, root).unwrap_or_else(|| outcome.path.clone());
        let reason = outcome
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
        eprintln!("  failed: {} ({})", shown.display(), reason);
    }
    if total > FAILURE_LIST_LIMIT {
        eprintln!("  ... and {} more", total - FAILURE_LIST_LIMIT);
    }
}
