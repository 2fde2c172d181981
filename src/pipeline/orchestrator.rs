use log::{debug, info};
use std::sync::Arc;

use crate::engine::cancel::CancellationSignal;
use crate::engine::executor::TransformExecutor;
use crate::engine::progress::{ProgressBar, create_counter, refresh_bar, update_progress_bar};
use crate::engine::strategies::StrategyOpts;
use crate::error::JobError;
use crate::pipeline::{self, Discovery, FileDiscoverer, PoolConfig, TaskHandler, WorkerPool};
use crate::utils::config::ProgressConsts;
use crate::{FileTask, Job, JobReport, JobState, Operation, RunOpts};

fn transition(state: &mut JobState, next: JobState) {
    debug!("job state: {} -> {}", state, next);
    *state = next;
}

/// Wrap the executor as a pool handler; ticks the progress bar per finished file.
fn task_handler(executor: Arc<TransformExecutor>, bar: Option<ProgressBar>) -> TaskHandler {
    Arc::new(move |task: FileTask| {
        let outcome = executor.execute(task);
        if let Some(bar) = &bar {
            update_progress_bar(bar, 1);
        }
        outcome
    })
}

fn discoverer_for(job: &Job, opts: &RunOpts, signal: &CancellationSignal) -> FileDiscoverer {
    let discoverer = FileDiscoverer::new(job.source_root(), job.recurse(), signal.clone())
        .follow_links(opts.follow_links)
        .skip_unreadable(opts.skip_unreadable);
    match job.operation() {
        Operation::Copy { target_dir } => discoverer.exclude_dir(target_dir),
        _ => discoverer,
    }
}

/// Feed discovered files to the pool until the walk ends, fails, or the signal is set.
/// Returns the number of tasks submitted.
fn submit_discovered(
    mut discovery: Discovery,
    pool: &WorkerPool,
    signal: &CancellationSignal,
    state: &mut JobState,
) -> Result<usize, JobError> {
    let mut submitted = 0;
    for item in discovery.by_ref() {
        let task = item?;
        if signal.is_set() {
            break;
        }
        if pool.submit(task).is_err() {
            break;
        }
        if submitted == 0 {
            transition(state, JobState::Running);
        }
        submitted += 1;
    }
    debug!(
        "discovery yielded {} files, {} submitted",
        discovery.yielded(),
        submitted
    );
    Ok(submitted)
}

/// Run `job` to completion or cancellation. Discovery runs on the calling thread; files are
/// transformed on the pool. The pool is drained before returning on every path.
pub fn execute_job(
    job: &Job,
    opts: &RunOpts,
    signal: &CancellationSignal,
) -> Result<JobReport, JobError> {
    let mut state = JobState::Validating;
    transition(&mut state, JobState::Scanning);
    info!(
        "{} on {}{}",
        job.operation(),
        job.source_root().display(),
        if job.recurse() { " (recursive)" } else { "" }
    );

    if signal.is_set() {
        transition(&mut state, JobState::Cancelled);
        transition(&mut state, JobState::Terminated);
        return Ok(JobReport {
            final_state: JobState::Cancelled,
            submitted: 0,
            not_run: 0,
            outcomes: Vec::new(),
            clean_drain: true,
        });
    }

    let executor = Arc::new(TransformExecutor::new(
        job.operation(),
        StrategyOpts {
            default_format: opts.default_format,
            atomic_write: opts.atomic_write,
        },
        signal.clone(),
    ));
    let bar = opts.verbose.then(|| {
        let b = create_counter(ProgressConsts::DESC);
        refresh_bar(&b);
        b
    });
    let mut pool = WorkerPool::new(
        PoolConfig::from_opts(opts),
        signal.clone(),
        task_handler(executor, bar),
    )?;

    let discoverer = discoverer_for(job, opts, signal);
    let skipped = discoverer.skipped();
    let scan = submit_discovered(discoverer.discover(), &pool, signal, &mut state);
    let drain = pool.shutdown(opts.shutdown_timeout);

    let submitted = match scan {
        Ok(n) => n,
        Err(e) => {
            transition(&mut state, JobState::Terminated);
            return Err(e);
        }
    };
    pipeline::report_skipped_dirs(opts.verbose, &skipped);

    let final_state = if signal.is_set() {
        JobState::Cancelled
    } else {
        JobState::Completed
    };
    transition(&mut state, final_state);
    transition(&mut state, JobState::Terminated);

    Ok(JobReport {
        final_state,
        submitted,
        not_run: drain.not_run,
        outcomes: drain.outcomes,
        clean_drain: drain.clean,
    })
}
