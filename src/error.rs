//! Error types: job-level (fatal, stop the run) and per-file (recorded in the outcome).

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a job. Everything except [`JobError::Discovery`] is raised before any file is touched.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("source directory does not exist: {0}")]
    MissingSource(PathBuf),

    #[error("source is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("scale factor must be a positive number, got {0}")]
    InvalidScale(f64),

    #[error("cannot create target directory {path}: {source}")]
    TargetDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start worker thread {index} of {workers}: {source}")]
    WorkerSpawn {
        index: usize,
        workers: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install cancellation handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),

    /// A directory could not be read while walking the source tree.
    #[error("error accessing directory {}: {message}", display_path(.path))]
    Discovery {
        path: Option<PathBuf>,
        message: String,
    },
}

impl JobError {
    /// True for errors raised while validating configuration (zero files touched).
    pub fn is_config(&self) -> bool {
        !matches!(self, JobError::Discovery { .. })
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

impl From<walkdir::Error> for JobError {
    fn from(err: walkdir::Error) -> Self {
        JobError::Discovery {
            path: err.path().map(PathBuf::from),
            message: err.to_string(),
        }
    }
}

/// Per-file failure. Never escapes the task that produced it.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("scaled size {width}x{height} has a zero dimension")]
    EmptyResize { width: u32, height: u32 },

    #[error("path has no file name")]
    NoFileName,

    #[error("transform panicked: {0}")]
    Panicked(String),
}

/// Returned by [`WorkerPool::submit`](crate::pipeline::WorkerPool::submit) after shutdown.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("worker pool is shut down")]
pub struct PoolClosed;
