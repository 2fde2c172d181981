//! imgbatch: apply one image transform (scale, negate, remove, copy) to every image in a
//! directory on a fixed pool of worker threads, with cooperative cancellation.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::{CancellationSignal, TransformExecutor};
pub use error::{JobError, PoolClosed, TransformError};
pub use pipeline::{FileDiscoverer, WorkerPool};

use log::debug;

/// Single entry point: run a validated `job` with `opts`, observing `signal`.
///
/// Discovery runs on the calling thread and transforms run on a pool of
/// [`RunOpts::worker_count`] threads. The call returns once the pool has drained (or was
/// force-stopped after [`RunOpts::shutdown_timeout`]).
///
/// - **`Ok(report)`** covers both completion and cancellation; check [`JobReport::final_state`].
///   Per-file failures are in `report.outcomes` and never make this an `Err`.
/// - **`Err`** only for a failed directory walk ([`JobError::Discovery`]) or when the OS
///   refuses a worker thread ([`JobError::WorkerSpawn`]).
///
/// ```ignore
/// let job = imgbatch::Job::new("photos", true, imgbatch::Operation::Negate)?;
/// let signal = imgbatch::CancellationSignal::new();
/// let report = imgbatch::run_job(&job, &imgbatch::RunOpts::default(), &signal)?;
/// println!("{} done, {} failed", report.succeeded(), report.failed());
/// ```
pub fn run_job(
    job: &Job,
    opts: &RunOpts,
    signal: &CancellationSignal,
) -> Result<JobReport, JobError> {
    let config_str = format!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
    debug!("{}", config_str);
    pipeline::execute_job(job, opts, signal)
}
