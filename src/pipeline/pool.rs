//! Fixed-size worker pool over a bounded crossbeam queue, with bounded drain on shutdown.
//!
//! Workers pull [`FileTask`]s, run the shared handler and push outcomes onto an unbounded
//! channel, so a worker never blocks on reporting. Shutdown closes the queue and waits up to a
//! timeout; after that, remaining queued tasks are dropped as not-run and busy threads are
//! detached. Dropping an open pool runs the same shutdown with the configured timeout.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::engine::cancel::CancellationSignal;
use crate::error::{JobError, PoolClosed};
use crate::utils::config::PoolConsts;
use crate::{FileTask, RunOpts, TransformOutcome};

/// Work done per task by a pool worker.
pub type TaskHandler = Arc<dyn Fn(FileTask) -> TransformOutcome + Send + Sync>;

#[derive(Clone, Copy, Debug)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub shutdown_timeout: Duration,
}

impl PoolConfig {
    pub fn from_opts(opts: &RunOpts) -> Self {
        let workers = opts.worker_count();
        Self {
            workers,
            queue_capacity: workers.saturating_mul(opts.queue_multiplier.max(1)),
            shutdown_timeout: opts.shutdown_timeout,
        }
    }
}

/// Result of [`WorkerPool::shutdown`].
#[derive(Debug)]
pub struct DrainReport {
    /// True when every worker exited before the timeout.
    pub clean: bool,
    pub outcomes: Vec<TransformOutcome>,
    /// Tasks that were submitted but never run (cancelled before start, or dropped by a forced stop).
    pub not_run: usize,
}

/// Shared state each worker thread holds.
struct WorkerCtx {
    task_rx: Receiver<FileTask>,
    outcome_tx: Sender<TransformOutcome>,
    signal: CancellationSignal,
    halt: Arc<AtomicBool>,
    not_run: Arc<AtomicUsize>,
    handler: TaskHandler,
}

/// Reports a worker's exit on drop, so panics still count toward the drain.
struct ExitNotice(Sender<()>);

impl Drop for ExitNotice {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

fn worker_loop(ctx: WorkerCtx, exit: ExitNotice) {
    let _exit = exit;
    while let Ok(task) = ctx.task_rx.recv() {
        if ctx.halt.load(Ordering::Acquire) || ctx.signal.is_set() {
            ctx.not_run.fetch_add(1, Ordering::Relaxed);
            continue;
        }
        let outcome = (ctx.handler)(task);
        let _ = ctx.outcome_tx.send(outcome);
    }
}

pub struct WorkerPool {
    task_tx: Option<Sender<FileTask>>,
    task_rx: Receiver<FileTask>,
    outcome_rx: Receiver<TransformOutcome>,
    exit_rx: Receiver<()>,
    handles: Vec<JoinHandle<()>>,
    halt: Arc<AtomicBool>,
    not_run: Arc<AtomicUsize>,
    config: PoolConfig,
}

impl WorkerPool {
    /// Spawn `config.workers` threads (at least one) that run `handler` on submitted tasks.
    ///
    /// The queue bound is clamped to [`PoolConsts::MAX_QUEUE_CAPACITY`]. If the OS refuses a
    /// thread, the ones already started are stopped and joined before the error is returned.
    pub fn new(
        config: PoolConfig,
        signal: CancellationSignal,
        handler: TaskHandler,
    ) -> Result<Self, JobError> {
        let config = PoolConfig {
            workers: config.workers.max(1),
            queue_capacity: config
                .queue_capacity
                .clamp(1, PoolConsts::MAX_QUEUE_CAPACITY),
            ..config
        };
        let (task_tx, task_rx) = bounded::<FileTask>(config.queue_capacity);
        let (outcome_tx, outcome_rx) = unbounded::<TransformOutcome>();
        let (exit_tx, exit_rx) = unbounded::<()>();
        let halt = Arc::new(AtomicBool::new(false));
        let not_run = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let ctx = WorkerCtx {
                task_rx: task_rx.clone(),
                outcome_tx: outcome_tx.clone(),
                signal: signal.clone(),
                halt: Arc::clone(&halt),
                not_run: Arc::clone(&not_run),
                handler: Arc::clone(&handler),
            };
            let exit = ExitNotice(exit_tx.clone());
            let spawned = thread::Builder::new()
                .name(format!("{}-{index}", PoolConsts::THREAD_NAME))
                .spawn(move || worker_loop(ctx, exit));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    // Closing the queue lets the started workers exit.
                    drop(task_tx);
                    for h in handles {
                        let _ = h.join();
                    }
                    return Err(JobError::WorkerSpawn {
                        index,
                        workers: config.workers,
                        source,
                    });
                }
            }
        }
        debug!(
            "worker pool: {} workers, queue bound {}",
            config.workers, config.queue_capacity
        );

        Ok(Self {
            task_tx: Some(task_tx),
            task_rx,
            outcome_rx,
            exit_rx,
            handles,
            halt,
            not_run,
            config,
        })
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }

    pub fn is_open(&self) -> bool {
        self.task_tx.is_some()
    }

    /// Queue a task. Blocks only while the queue is full. Fails once the pool is shut down.
    pub fn submit(&self, task: FileTask) -> Result<(), PoolClosed> {
        match &self.task_tx {
            Some(tx) => tx.send(task).map_err(|_| PoolClosed),
            None => Err(PoolClosed),
        }
    }

    /// Stop accepting tasks and wait up to `timeout` for queued and in-flight tasks.
    /// On timeout, drop what is still queued and detach busy workers. A second call returns an empty report.
    pub fn shutdown(&mut self, timeout: Duration) -> DrainReport {
        if self.task_tx.take().is_none() {
            return DrainReport {
                clean: true,
                outcomes: Vec::new(),
                not_run: 0,
            };
        }
        let deadline = Instant::now() + timeout;
        let expected = self.handles.len();
        let mut exited = 0;
        while exited < expected && self.exit_rx.recv_deadline(deadline).is_ok() {
            exited += 1;
        }

        let clean = exited == expected;
        if clean {
            for h in self.handles.drain(..) {
                let _ = h.join();
            }
        } else {
            self.halt.store(true, Ordering::Release);
            let dropped = self.task_rx.try_iter().count();
            self.not_run.fetch_add(dropped, Ordering::Relaxed);
            warn!(
                "Workers did not finish within {:?}; {} still busy, {} queued files dropped",
                timeout,
                expected - exited,
                dropped
            );
            // Busy threads are detached; they stop after their current file.
            self.handles.clear();
        }

        DrainReport {
            clean,
            outcomes: self.outcome_rx.try_iter().collect(),
            not_run: self.not_run.swap(0, Ordering::Relaxed),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.is_open() {
            let report = self.shutdown(self.config.shutdown_timeout);
            debug!(
                "worker pool dropped while open: {} outcomes discarded, clean drain: {}",
                report.outcomes.len(),
                report.clean
            );
        }
    }
}
