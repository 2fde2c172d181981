//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    settings_filename: String,
    temp_suffix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                settings_filename: format!(".{pkg}.toml"),
                temp_suffix: format!(".{pkg}.tmp"),
            }
        })
    }

    /// Per-directory settings file read by the CLI (e.g. `.imgbatch.toml`).
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }

    /// Suffix of the scratch file used by atomic writes. Never matches the image allowlist.
    pub fn temp_suffix(&self) -> &str {
        &self.temp_suffix
    }
}

// ---- Discovery ----

/// Lowercase file-name suffixes that mark a file as an image candidate.
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".bmp", ".gif"];

// ---- Worker pool ----

/// Worker pool sizing and shutdown.
pub struct PoolConsts;

impl PoolConsts {
    /// Queue slots per worker; submit blocks once `workers * QUEUE_MULTIPLIER` tasks are waiting.
    pub const QUEUE_MULTIPLIER: usize = 4;
    /// Default wait for queued and in-flight tasks on shutdown.
    pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);
    /// Worker count when available parallelism cannot be queried.
    pub const FALLBACK_WORKERS: usize = 4;
    /// Upper bound on queue slots; crossbeam allocates a bounded queue up front.
    pub const MAX_QUEUE_CAPACITY: usize = 1 << 16;
    /// Worker threads are named `<THREAD_NAME>-<index>`.
    pub const THREAD_NAME: &'static str = "imgbatch-worker";
}

// ---- Progress ----

/// Progress bar tuning.
pub struct ProgressConsts;

impl ProgressConsts {
    pub const DESC: &'static str = "Processing";
    pub const UNIT: &'static str = " files";
}

// ---- Summary output ----

/// With verbose output, failures beyond this many are summarised instead of listed.
pub const FAILURE_LIST_LIMIT: usize = 100;
