//! Public and internal types for the imgbatch API and pipeline.

use image::ImageFormat;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{JobError, TransformError};
use crate::utils::config::PoolConsts;

/// The single transform applied to every discovered file of a job.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Resize by `factor` (finite, > 0) and overwrite in place.
    Scale { factor: f64 },
    /// Invert the colour channels and overwrite in place.
    Negate,
    /// Delete the file.
    Remove,
    /// Copy the file into `target_dir` under its own name.
    Copy { target_dir: PathBuf },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Scale { factor } => write!(f, "scale({factor})"),
            Operation::Negate => write!(f, "negate"),
            Operation::Remove => write!(f, "remove"),
            Operation::Copy { target_dir } => write!(f, "copy({})", target_dir.display()),
        }
    }
}

/// One validated request: apply `operation` to the image files under `source_root`.
///
/// Only [`Job::new`] builds one, so a `Job` in hand always passed validation.
#[derive(Clone, Debug)]
pub struct Job {
    source_root: PathBuf,
    recurse: bool,
    operation: Operation,
}

impl Job {
    /// Validate and build a job. Creates the copy target directory when it is missing.
    ///
    /// Fails before any file is touched when the source is missing or not a directory,
    /// the scale factor is not a finite positive number, or the target directory cannot be created.
    pub fn new(
        source_root: impl Into<PathBuf>,
        recurse: bool,
        operation: Operation,
    ) -> Result<Self, JobError> {
        let source_root = source_root.into();
        if !source_root.exists() {
            return Err(JobError::MissingSource(source_root));
        }
        if !source_root.is_dir() {
            return Err(JobError::NotADirectory(source_root));
        }
        match &operation {
            Operation::Scale { factor } if !(factor.is_finite() && *factor > 0.0) => {
                return Err(JobError::InvalidScale(*factor));
            }
            Operation::Copy { target_dir } if !target_dir.is_dir() => {
                std::fs::create_dir_all(target_dir).map_err(|source| JobError::TargetDir {
                    path: target_dir.clone(),
                    source,
                })?;
            }
            _ => {}
        }
        Ok(Job {
            source_root,
            recurse,
            operation,
        })
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn recurse(&self) -> bool {
        self.recurse
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

/// A discovered file waiting for a worker. Consumed exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
}

impl FileTask {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Result of running the job's strategy on one file.
#[derive(Debug)]
pub struct TransformOutcome {
    pub path: PathBuf,
    pub success: bool,
    pub error: Option<TransformError>,
}

impl TransformOutcome {
    pub fn ok(path: PathBuf) -> Self {
        Self {
            path,
            success: true,
            error: None,
        }
    }

    pub fn failed(path: PathBuf, error: TransformError) -> Self {
        Self {
            path,
            success: false,
            error: Some(error),
        }
    }

    /// True when the task was skipped by the executor's cancellation check.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, Some(TransformError::Cancelled))
    }
}

/// Lifecycle of a job. `Validating` covers [`Job::new`]; the orchestrator walks the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Validating,
    Scanning,
    Running,
    Completed,
    Cancelled,
    Terminated,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Validating => "validating",
            JobState::Scanning => "scanning",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
            JobState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Aggregated result of [`run_job`](crate::run_job).
#[derive(Debug)]
pub struct JobReport {
    /// `Completed` or `Cancelled`.
    pub final_state: JobState,
    /// Tasks handed to the pool.
    pub submitted: usize,
    /// Submitted tasks that a worker dropped without running (cancellation or forced shutdown).
    pub not_run: usize,
    /// One outcome per task a worker picked up, in completion order.
    pub outcomes: Vec<TransformOutcome>,
    /// False when the pool had to be force-stopped after the shutdown timeout.
    pub clean_drain: bool,
}

impl JobReport {
    pub fn was_cancelled(&self) -> bool {
        self.final_state == JobState::Cancelled
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// Failures other than cancellation.
    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_cancelled()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TransformOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !o.success && !o.is_cancelled())
    }
}

/// Run tuning that does not change what a job does, only how it runs.
#[derive(Clone, Debug)]
pub struct RunOpts {
    /// Worker thread count. When None, one per available CPU.
    pub workers: Option<usize>,
    /// Queue capacity per worker (queue bound = workers * multiplier).
    pub queue_multiplier: usize,
    /// How long shutdown waits for queued and in-flight tasks before force-stopping.
    pub shutdown_timeout: Duration,
    /// Encoding used when a file's extension does not name a known format.
    pub default_format: ImageFormat,
    /// Follow symbolic links while walking.
    pub follow_links: bool,
    /// Skip unreadable subdirectories (logged) instead of failing the job.
    pub skip_unreadable: bool,
    /// Write scaled/negated images to a temp file and rename over the original.
    pub atomic_write: bool,
    /// Progress bar and per-failure listing.
    pub verbose: bool,
    /// Also cancel when ESC is read from stdin.
    pub esc_cancel: bool,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            workers: None,
            queue_multiplier: PoolConsts::QUEUE_MULTIPLIER,
            shutdown_timeout: PoolConsts::SHUTDOWN_TIMEOUT,
            default_format: ImageFormat::Jpeg,
            follow_links: false,
            skip_unreadable: false,
            atomic_write: false,
            verbose: false,
            esc_cancel: false,
        }
    }
}

impl RunOpts {
    /// Effective worker count: the override when set, else available parallelism (never 0).
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(PoolConsts::FALLBACK_WORKERS)
            })
            .max(1)
    }
}
