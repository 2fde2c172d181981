//! Per-task entry point: cancellation check, strategy dispatch, failure isolation.

use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};

use crate::engine::cancel::CancellationSignal;
use crate::engine::strategies::{StrategyOpts, Transform};
use crate::error::TransformError;
use crate::{FileTask, Operation, TransformOutcome};

/// Runs the job's strategy on one file at a time. Shared by all workers.
pub struct TransformExecutor {
    strategy: Box<dyn Transform>,
    signal: CancellationSignal,
}

impl TransformExecutor {
    pub fn new(operation: &Operation, opts: StrategyOpts, signal: CancellationSignal) -> Self {
        Self::with_strategy(operation.strategy(opts), signal)
    }

    pub fn with_strategy(strategy: Box<dyn Transform>, signal: CancellationSignal) -> Self {
        Self { strategy, signal }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Apply the strategy to `task.path`. Never panics and never returns an error:
    /// every failure, including a panic in the strategy, becomes a failed outcome.
    pub fn execute(&self, task: FileTask) -> TransformOutcome {
        let FileTask { path } = task;
        if self.signal.is_set() {
            return TransformOutcome::failed(path, TransformError::Cancelled);
        }
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.strategy.apply(&path, &self.signal)
        }))
        .unwrap_or_else(|payload| Err(TransformError::Panicked(panic_message(&payload))));

        match result {
            Ok(()) => {
                debug!("{} {}", self.strategy.name(), path.display());
                TransformOutcome::ok(path)
            }
            Err(TransformError::Cancelled) => {
                TransformOutcome::failed(path, TransformError::Cancelled)
            }
            Err(e) => {
                warn!("Error processing {}: {}", path.display(), e);
                TransformOutcome::failed(path, e)
            }
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
